use crate::model::BookingStatus;

use super::EngineError;

/// Outgoing edges per status. Terminal statuses have none.
pub fn allowed_targets(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Requested => &[
            BookingStatus::Accepted,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ],
        BookingStatus::Accepted => &[BookingStatus::Completed, BookingStatus::Cancelled],
        BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed => &[],
    }
}

/// Pure table lookup. Self-transitions are never valid.
pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
    allowed_targets(from).contains(&to)
}

pub fn ensure_transition(from: BookingStatus, to: BookingStatus) -> Result<(), EngineError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_fans_out() {
        assert!(is_valid_transition(BookingStatus::Requested, BookingStatus::Accepted));
        assert!(is_valid_transition(BookingStatus::Requested, BookingStatus::Rejected));
        assert!(is_valid_transition(BookingStatus::Requested, BookingStatus::Cancelled));
        assert!(!is_valid_transition(BookingStatus::Requested, BookingStatus::Completed));
    }

    #[test]
    fn accepted_can_finish_or_cancel() {
        assert!(is_valid_transition(BookingStatus::Accepted, BookingStatus::Completed));
        assert!(is_valid_transition(BookingStatus::Accepted, BookingStatus::Cancelled));
        assert!(!is_valid_transition(BookingStatus::Accepted, BookingStatus::Requested));
        assert!(!is_valid_transition(BookingStatus::Accepted, BookingStatus::Rejected));
    }

    #[test]
    fn terminal_statuses_have_no_edges() {
        for terminal in [
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(allowed_targets(terminal).is_empty());
            for to in BookingStatus::ALL {
                assert!(!is_valid_transition(terminal, to));
            }
        }
    }

    #[test]
    fn self_transitions_rejected() {
        for status in BookingStatus::ALL {
            assert!(!is_valid_transition(status, status));
        }
    }

    /// Every (from, to) pair outside the table fails with the pair echoed
    /// back in the error.
    #[test]
    fn closure_over_all_pairs() {
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let result = ensure_transition(from, to);
                if allowed_targets(from).contains(&to) {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(
                        result,
                        Err(EngineError::InvalidTransition { from, to })
                    );
                }
            }
        }
    }
}
