//! Prometheus metrics for command dispatch.
//!
//! - `slbot_dispatch_total{command,outcome}` - Resolved dispatches by command and outcome
//! - `slbot_unmatched_total` - Messages no command claimed
//! - `slbot_command_errors_total{command,error}` - Handler and scene failures
//! - `slbot_command_duration_seconds{command}` - Dispatch latency of resolved commands
//!
//! Recording is a no-op until [`init`] has been called, so the library can be
//! embedded without a metrics endpoint.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Resolved dispatches by command id and outcome.
pub static DISPATCH_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Messages that matched no registered command.
pub static UNMATCHED: OnceLock<IntCounter> = OnceLock::new();

/// Handler/scene errors by command id and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Dispatch latency by resolved command id.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Repeated calls keep the first set of metrics.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(
                        error = %e,
                        concat!("Failed to register metric ", stringify!($metric))
                    );
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(
        DISPATCH_COUNTER,
        IntCounterVec::new(
            Opts::new("slbot_dispatch_total", "Resolved dispatches by command and outcome"),
            &["command", "outcome"]
        )
    );
    register!(
        UNMATCHED,
        IntCounter::new("slbot_unmatched_total", "Messages matching no command")
    );
    register!(
        COMMAND_ERRORS,
        IntCounterVec::new(
            Opts::new("slbot_command_errors_total", "Command handler errors"),
            &["command", "error"]
        )
    );
    register!(
        COMMAND_LATENCY,
        HistogramVec::new(
            HistogramOpts::new("slbot_command_duration_seconds", "Dispatch latency by command")
                .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["command"]
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a resolved dispatch.
#[inline]
pub fn record_dispatch(command: &str, outcome: &str) {
    if let Some(c) = DISPATCH_COUNTER.get() {
        c.with_label_values(&[command, outcome]).inc();
    }
}

/// Record a message no command claimed.
#[inline]
pub fn record_unmatched() {
    if let Some(c) = UNMATCHED.get() {
        c.inc();
    }
}

/// Record a handler or scene error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record dispatch latency for a resolved command.
#[inline]
pub fn record_latency(command: &str, duration_secs: f64) {
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}
