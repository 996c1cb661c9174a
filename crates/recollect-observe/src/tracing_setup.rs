//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use recollect_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
//!
//! // Human-readable logs at the level chosen by `-v` flags
//! init_tracing(&TracingOptions::from_verbosity(1, false)).unwrap();
//!
//! // ... run the command ...
//! shutdown_tracing();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Name reported by the OpenTelemetry tracer.
pub const TRACER_NAME: &str = "recollect";

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How the global subscriber should behave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// One JSON object per event instead of text lines.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl TracingOptions {
    /// Map CLI `-v` count and `--quiet` to a default filter.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let filter = match verbose {
            0 if quiet => "error",
            0 => "warn",
            1 => "info,recollect=debug",
            _ => "trace",
        };
        Self {
            filter: filter.to_string(),
            json: false,
            otel: false,
        }
    }
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self::from_verbosity(0, false)
    }
}

/// Initialize the global tracing subscriber.
///
/// - Logs go to stderr so command output on stdout stays machine-readable.
/// - `RUST_LOG` overrides `options.filter` when set.
/// - With `options.otel`, spans are additionally exported through
///   OpenTelemetry to stdout (local development; swap the exporter for OTLP
///   in production).
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.filter));

    let fmt_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer(TRACER_NAME);

        // Store the provider for shutdown and register it globally.
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// Call this before process exit to ensure all buffered spans are exported.
/// Safe to call even when OTel was not enabled (no-op in that case).
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(TracingOptions::from_verbosity(0, true).filter, "error");
        assert_eq!(TracingOptions::from_verbosity(0, false).filter, "warn");
        assert_eq!(
            TracingOptions::from_verbosity(1, false).filter,
            "info,recollect=debug"
        );
        assert_eq!(TracingOptions::from_verbosity(3, true).filter, "trace");
    }

    #[test]
    fn default_is_plain_warn() {
        let options = TracingOptions::default();
        assert_eq!(options.filter, "warn");
        assert!(!options.json);
        assert!(!options.otel);
    }

    #[test]
    fn shutdown_without_otel_is_noop() {
        shutdown_tracing();
    }
}
