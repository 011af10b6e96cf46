use crate::model::Ms;

/// Lower bound for any timestamp the engine accepts.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;

/// Upper bound for any timestamp: 2100-01-01T00:00:00Z.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Longest service a booking may snapshot (one full day).
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

pub const MAX_NOTES_LEN: usize = 2_000;

pub const MAX_REASON_LEN: usize = 500;

/// Widest availability query window (~90 days).
pub const MAX_QUERY_WINDOW_MS: Ms = 90 * 24 * 3_600_000;

/// Total attempts per queued command; only retryable failures re-attempt.
pub const MAX_COMMAND_ATTEMPTS: u32 = 3;

pub const MAX_PENDING_COMMANDS: usize = 1_024;
