use std::net::SocketAddr;

use crate::engine::BookingCommand;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "bookflow_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "bookflow_command_duration_seconds";

/// Counter: creations refused because the slot was taken.
pub const CONFLICTS_TOTAL: &str = "bookflow_conflicts_total";

// ── Queue metrics ───────────────────────────────────────────────

/// Gauge: commands waiting in the queue.
pub const QUEUE_PENDING: &str = "bookflow_queue_pending";

/// Counter: queued attempts that were retried after a transient failure.
pub const QUEUE_RETRIES_TOTAL: &str = "bookflow_queue_retries_total";

/// Counter: commands moved to the failed list.
pub const QUEUE_FAILED_TOTAL: &str = "bookflow_queue_failed_total";

/// Counter: undo requests that executed an inverse command.
pub const UNDO_TOTAL: &str = "bookflow_undo_total";

// ── Notification metrics ────────────────────────────────────────

/// Counter: observer invocations that succeeded.
pub const NOTIFICATIONS_TOTAL: &str = "bookflow_notifications_total";

/// Counter: observer invocations that errored (logged, never propagated).
pub const NOTIFICATION_FAILURES_TOTAL: &str = "bookflow_notification_failures_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a command variant to a short label for metrics.
pub fn command_label(cmd: &BookingCommand) -> &'static str {
    match cmd {
        BookingCommand::Create { .. } => "create_booking",
        BookingCommand::Accept { .. } => "accept_booking",
        BookingCommand::Reject { .. } => "reject_booking",
        BookingCommand::Cancel { .. } => "cancel_booking",
        BookingCommand::Complete { .. } => "complete_booking",
    }
}
