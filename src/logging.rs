//! Logging and tracing setup for the cavern binary.
//!
//! Diagnostics and cave reports are emitted with the `tracing` macros; the
//! subscriber installed here decides how they are rendered. Everything goes to
//! stderr so stdout stays free for machine-readable output.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Output format of the tracing subscriber.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
/// Subsequent calls are ignored.
pub fn init_tracing(format: LogFormat) {
    INIT.call_once(|| {
        match format {
            LogFormat::Text => {
                let fmt_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false);
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .init();
            }
            LogFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true);
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .init();
            }
        }

        debug!(?format, "cavern tracing initialized");
    });
}
