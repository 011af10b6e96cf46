use ulid::Ulid;

use crate::model::BookingStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    NotFound(Ulid),
    /// The acting identity may not mutate this booking. The message is a
    /// generic denial on purpose — it never names the real owner.
    Unauthorized,
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// The candidate window collides with these bookings (full set, not
    /// just the first hit).
    Conflict(Vec<Ulid>),
    Validation(&'static str),
    /// Retryable infrastructure failure; the only kind the queue retries.
    TransientStore(String),
    CannotUndo(&'static str),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransientStore(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::Unauthorized => write!(f, "not authorized"),
            EngineError::InvalidTransition { from, to } => {
                write!(f, "invalid transition: {from} -> {to}")
            }
            EngineError::Conflict(ids) => {
                write!(f, "time conflict with {} booking(s)", ids.len())
            }
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::TransientStore(e) => write!(f, "transient store error: {e}"),
            EngineError::CannotUndo(msg) => write!(f, "cannot undo: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
