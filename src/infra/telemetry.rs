use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "flexpage_resolve_hit_total",
            Unit::Count,
            "Resolutions answered from a cached page."
        );
        describe_counter!(
            "flexpage_resolve_negative_hit_total",
            Unit::Count,
            "Resolutions answered from a cached \"no page\" marker."
        );
        describe_counter!(
            "flexpage_resolve_miss_total",
            Unit::Count,
            "Resolutions that found nothing cached and queried the store."
        );
        describe_counter!(
            "flexpage_resolve_collision_total",
            Unit::Count,
            "Cached pages rejected because they belong to a different path."
        );
        describe_counter!(
            "flexpage_cache_backend_error_total",
            Unit::Count,
            "Cache backend operations that failed and were skipped, labelled by op."
        );
        describe_counter!(
            "flexpage_cache_evict_total",
            Unit::Count,
            "Entries evicted from the in-memory cache due to capacity."
        );
        describe_counter!(
            "flexpage_intercept_total",
            Unit::Count,
            "Requests answered by the page interceptor, labelled by handler kind."
        );
    });
}
