//! Prometheus metrics collection for groupcast.
//!
//! Metrics are exposed on an optional HTTP endpoint (see [`crate::http`]).
//! Every recording helper is a no-op until [`init`] has run, so handlers and
//! tests can call them unconditionally.
//!
//! - `groupcast_command_total{command}` - Commands processed by type
//! - `groupcast_command_errors_total{command,error}` - Protocol errors returned
//! - `groupcast_message_fanout` - Recipients per relayed message (histogram)

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::{Once, OnceLock};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Relayed messages successfully queued to recipients.
pub static MESSAGES_DELIVERED: OnceLock<IntCounter> = OnceLock::new();

/// Failed sends to recipients, by reason.
pub static SEND_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Commands processed by type.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by type and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently open connections, named or not.
pub static OPEN_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Clients holding a name.
pub static NAMED_CLIENTS: OnceLock<IntGauge> = OnceLock::new();

/// Groups with at least one member.
pub static ACTIVE_GROUPS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Recipients per relayed message.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called once at startup when the metrics endpoint is enabled. Later calls
/// are no-ops.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(
                            error = %e,
                            concat!("Failed to register metric ", stringify!($metric))
                        );
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        concat!("Failed to create metric ", stringify!($metric))
                    );
                }
            }
        };
    }

    register!(
        MESSAGES_DELIVERED,
        IntCounter::new(
            "groupcast_messages_delivered_total",
            "Relayed messages queued to recipients"
        )
    );
    register!(
        SEND_FAILURES,
        IntCounterVec::new(
            Opts::new("groupcast_send_failures_total", "Failed sends to recipients"),
            &["reason"]
        )
    );
    register!(
        COMMAND_COUNTER,
        IntCounterVec::new(
            Opts::new("groupcast_command_total", "Commands processed by type"),
            &["command"]
        )
    );
    register!(
        COMMAND_ERRORS,
        IntCounterVec::new(
            Opts::new("groupcast_command_errors_total", "Command errors by type"),
            &["command", "error"]
        )
    );
    register!(
        OPEN_CONNECTIONS,
        IntGauge::new("groupcast_open_connections", "Currently open connections")
    );
    register!(
        NAMED_CLIENTS,
        IntGauge::new("groupcast_named_clients", "Clients holding a name")
    );
    register!(
        ACTIVE_GROUPS,
        IntGauge::new("groupcast_active_groups", "Groups with at least one member")
    );
    register!(
        MESSAGE_FANOUT,
        Histogram::with_opts(
            HistogramOpts::new("groupcast_message_fanout", "Recipients per relayed message")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0])
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

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record a processed command.
#[inline]
pub fn record_command(command: &str) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record one relayed message: recipients attempted and how many were queued.
#[inline]
pub fn record_delivery(recipients: usize, delivered: usize) {
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(recipients as f64);
    }
    if let Some(c) = MESSAGES_DELIVERED.get() {
        c.inc_by(delivered as u64);
    }
}

/// Record a failed send to a recipient.
#[inline]
pub fn record_send_failure(reason: &str) {
    if let Some(c) = SEND_FAILURES.get() {
        c.with_label_values(&[reason]).inc();
    }
}

/// Update the open connection gauge.
#[inline]
pub fn set_open_connections(count: usize) {
    if let Some(g) = OPEN_CONNECTIONS.get() {
        g.set(count as i64);
    }
}

/// Update the registry gauges.
#[inline]
pub fn set_registry_sizes(clients: usize, groups: usize) {
    if let Some(g) = NAMED_CLIENTS.get() {
        g.set(clients as i64);
    }
    if let Some(g) = ACTIVE_GROUPS.get() {
        g.set(groups as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("JOIN");
        record_command_error("JOIN", "group_full");
        record_delivery(3, 2);
        record_send_failure("queue_full");
        set_open_connections(4);
        set_registry_sizes(2, 1);

        let output = gather_metrics();
        assert!(output.contains("groupcast_command_total"));
        assert!(output.contains("groupcast_command_errors_total"));
        assert!(output.contains("groupcast_message_fanout"));
        assert!(output.contains("groupcast_open_connections"));
        assert!(output.contains("groupcast_active_groups"));
    }
}
