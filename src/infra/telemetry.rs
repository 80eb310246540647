use std::io;
use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::metrics::{
    METRIC_STORE_CONFLICT_TOTAL, METRIC_STORE_DELETE_TOTAL, METRIC_STORE_LOAD_SKIPPED_TOTAL,
    METRIC_STORE_SAVE_TOTAL, METRIC_STORE_WRITE_MS,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber writing to stderr, so command output on
/// stdout stays machine readable.
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
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_STORE_SAVE_TOTAL,
            Unit::Count,
            "Total number of posts written to the store."
        );
        describe_counter!(
            METRIC_STORE_DELETE_TOTAL,
            Unit::Count,
            "Total number of posts deleted from the store."
        );
        describe_counter!(
            METRIC_STORE_CONFLICT_TOTAL,
            Unit::Count,
            "Writes rejected because of a slug, id or version conflict."
        );
        describe_counter!(
            METRIC_STORE_LOAD_SKIPPED_TOTAL,
            Unit::Count,
            "Post directories skipped while loading the store."
        );
        describe_histogram!(
            METRIC_STORE_WRITE_MS,
            Unit::Milliseconds,
            "Post write latency in milliseconds."
        );
    });
}
