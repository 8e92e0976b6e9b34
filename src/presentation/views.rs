//! View models, askama templates and the name-based template registry.

use std::collections::HashMap;

use crate::application::error::{ErrorReport, HttpError};
use crate::domain::entities::PageRecord;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

pub const PAGE_DETAIL_TEMPLATE: &str = "pages/page_detail.html";
pub const HOME_TEMPLATE: &str = "pages/home.html";
pub const LANDING_TEMPLATE: &str = "pages/landing.html";
pub const PLAIN_TEMPLATE: &str = "pages/plain.html";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(path: &str) -> Response {
    let view = PageView {
        url: path.to_string(),
        title: "Page not found".to_string(),
        summary: String::new(),
        content_html: String::new(),
        lead: None,
    };
    let mut response = render_template_response(NotFoundTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Values a page template can read.
#[derive(Debug, Clone)]
pub struct PageView {
    pub url: String,
    pub title: String,
    pub summary: String,
    /// Trusted HTML, emitted unescaped.
    pub content_html: String,
    /// Extra line set by custom handlers.
    pub lead: Option<String>,
}

impl PageView {
    pub fn from_page(page: &PageRecord) -> Self {
        Self {
            url: page.absolute_url().to_string(),
            title: page.title.clone(),
            summary: page.summary.clone(),
            content_html: page.content_html.clone(),
            lead: None,
        }
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = Some(lead.into());
        self
    }
}

#[derive(Template)]
#[template(path = "pages/page_detail.html")]
pub struct PageDetailTemplate {
    pub view: PageView,
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub view: PageView,
}

#[derive(Template)]
#[template(path = "pages/landing.html")]
pub struct LandingTemplate {
    pub view: PageView,
}

#[derive(Template)]
#[template(path = "pages/plain.html")]
pub struct PlainTemplate {
    pub view: PageView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub view: PageView,
}

pub type RenderFn = fn(&PageView) -> Result<String, AskamaError>;

/// Template lookup by name, standing in for a template search path.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, RenderFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every page template compiled into the binary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PAGE_DETAIL_TEMPLATE, |view| {
            PageDetailTemplate { view: view.clone() }.render()
        });
        registry.register(HOME_TEMPLATE, |view| {
            HomeTemplate { view: view.clone() }.render()
        });
        registry.register(LANDING_TEMPLATE, |view| {
            LandingTemplate { view: view.clone() }.render()
        });
        registry.register(PLAIN_TEMPLATE, |view| {
            PlainTemplate { view: view.clone() }.render()
        });
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, render: RenderFn) {
        self.templates.insert(name.into(), render);
    }

    /// Renders `view` with the first registered name in `names`.
    pub fn render(&self, names: &[String], view: &PageView) -> Result<Html<String>, HttpError> {
        let Some(render) = names.iter().find_map(|name| self.templates.get(name.as_str())) else {
            return Err(HttpError::new(
                "presentation::views::TemplateRegistry::render",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Template rendering failed",
                format!("template does not exist: tried {}", names.join(", ")),
            ));
        };

        render(view).map(Html).map_err(|err| {
            TemplateRenderError::new(
                "presentation::views::TemplateRegistry::render",
                "Template rendering failed",
                err,
            )
            .into()
        })
    }
}
