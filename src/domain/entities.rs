//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

pub const TITLE_MAX_LEN: usize = 150;
pub const URL_MAX_LEN: usize = 200;
pub const SUMMARY_MAX_LEN: usize = 250;
pub const VIEW_MAX_LEN: usize = 100;
pub const TEMPLATE_MAX_LEN: usize = 250;

/// A page that lives outside the static route table and is resolved per request.
///
/// Records are immutable value snapshots: the resolution cache hands out clones,
/// so a cached record never observes a later write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub id: Uuid,
    /// Root-relative path the page answers on, e.g. `/about/`.
    pub url: String,
    pub title: String,
    pub summary: String,
    /// Identifier of a registered page handler that replaces the default view.
    pub view: Option<String>,
    /// Template name tried before the handler's own templates.
    pub template: Option<String>,
    /// Rendered body owned by the content subsystem; passed through untouched.
    pub content_html: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PageRecord {
    pub fn absolute_url(&self) -> &str {
        &self.url
    }

    /// The custom view identifier, ignoring blank values.
    pub fn custom_view(&self) -> Option<&str> {
        non_blank(self.view.as_deref())
    }

    /// The custom template name, ignoring blank values.
    pub fn custom_template(&self) -> Option<&str> {
        non_blank(self.template.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn page(url: &str) -> PageRecord {
        let now = OffsetDateTime::now_utc();
        PageRecord {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: format!("Page at {url}"),
            summary: String::new(),
            view: None,
            template: None,
            content_html: "<p>body</p>".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_is_the_stored_url() {
        let page = fixtures::page("/my-funky-url/");
        assert_eq!(page.absolute_url(), "/my-funky-url/");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut page = fixtures::page("/");
        page.view = Some("   ".to_string());
        page.template = Some(String::new());
        assert_eq!(page.custom_view(), None);
        assert_eq!(page.custom_template(), None);

        page.view = Some(" site.landing ".to_string());
        assert_eq!(page.custom_view(), Some("site.landing"));
    }
}
