use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::{
    Booking, BookingStatus, Ms, PaymentMethod, StatusTimestamps, Window, MINUTE_MS,
};

use super::conflict::{find_conflicts, validate_window};
use super::{guard, status, Engine, EngineError};

/// One lifecycle operation, carrying its immutable inputs. Construction is
/// free of side effects; everything happens in `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingCommand {
    Create {
        customer_id: Ulid,
        service_id: Ulid,
        booking_time: Ms,
        staff_id: Option<Ulid>,
        notes: Option<String>,
        payment_method: PaymentMethod,
    },
    Accept {
        booking_id: Ulid,
        actor_id: Ulid,
    },
    Reject {
        booking_id: Ulid,
        actor_id: Ulid,
        /// Threaded into the notification payload only; never stored.
        reason: Option<String>,
    },
    Cancel {
        booking_id: Ulid,
        actor_id: Ulid,
    },
    Complete {
        booking_id: Ulid,
        actor_id: Ulid,
    },
}

impl BookingCommand {
    /// Execute against the engine's collaborators, returning the booking as
    /// persisted. Each failure mode maps to exactly one `EngineError` kind;
    /// callers must not conflate them.
    pub async fn execute(&self, engine: &Engine) -> Result<Booking, EngineError> {
        match self {
            BookingCommand::Create {
                customer_id,
                service_id,
                booking_time,
                staff_id,
                notes,
                payment_method,
            } => {
                execute_create(
                    engine,
                    *customer_id,
                    *service_id,
                    *booking_time,
                    *staff_id,
                    notes.clone(),
                    *payment_method,
                )
                .await
            }
            BookingCommand::Accept { booking_id, actor_id } => {
                execute_owner_transition(engine, *booking_id, *actor_id, BookingStatus::Accepted, None)
                    .await
            }
            BookingCommand::Reject {
                booking_id,
                actor_id,
                reason,
            } => {
                if let Some(r) = reason
                    && r.len() > MAX_REASON_LEN {
                        return Err(EngineError::Validation("reason too long"));
                    }
                execute_owner_transition(
                    engine,
                    *booking_id,
                    *actor_id,
                    BookingStatus::Rejected,
                    reason.clone(),
                )
                .await
            }
            BookingCommand::Cancel { booking_id, actor_id } => {
                execute_cancel(engine, *booking_id, *actor_id).await
            }
            BookingCommand::Complete { booking_id, actor_id } => {
                execute_owner_transition(engine, *booking_id, *actor_id, BookingStatus::Completed, None)
                    .await
            }
        }
    }

    /// Human-readable description for history entries and logs.
    pub fn describe(&self) -> String {
        match self {
            BookingCommand::Create {
                service_id,
                booking_time,
                ..
            } => format!("create booking for service {service_id} at {booking_time}"),
            BookingCommand::Accept { booking_id, actor_id } => {
                format!("accept booking {booking_id} by {actor_id}")
            }
            BookingCommand::Reject {
                booking_id,
                actor_id,
                reason,
            } => match reason {
                Some(r) => format!("reject booking {booking_id} by {actor_id} ({r})"),
                None => format!("reject booking {booking_id} by {actor_id}"),
            },
            BookingCommand::Cancel { booking_id, actor_id } => {
                format!("cancel booking {booking_id} by {actor_id}")
            }
            BookingCommand::Complete { booking_id, actor_id } => {
                format!("complete booking {booking_id} by {actor_id}")
            }
        }
    }
}

async fn execute_create(
    engine: &Engine,
    customer_id: Ulid,
    service_id: Ulid,
    booking_time: Ms,
    staff_id: Option<Ulid>,
    notes: Option<String>,
    payment_method: PaymentMethod,
) -> Result<Booking, EngineError> {
    if let Some(ref n) = notes
        && n.len() > MAX_NOTES_LEN {
            return Err(EngineError::Validation("notes too long"));
        }

    let service = engine.catalog.get_service(service_id).await?;
    if !service.is_active {
        return Err(EngineError::Validation("service is not active"));
    }
    if service.duration_minutes == 0 || service.duration_minutes > MAX_DURATION_MINUTES {
        return Err(EngineError::Validation("service duration out of range"));
    }

    let now = engine.clock.now_ms();
    if booking_time <= now {
        return Err(EngineError::Validation("booking time must be in the future"));
    }

    let window = Window::new(
        booking_time,
        booking_time + service.duration_minutes as Ms * MINUTE_MS,
    );
    validate_window(&window)?;

    // Conflict check and insert must be atomic per business, or two racing
    // requests for overlapping slots could both land.
    let lock = engine.create_lock(service.business_id);
    let slot = lock.lock().await;

    let conflicts = find_conflicts(
        engine.store.as_ref(),
        service.business_id,
        staff_id,
        window,
        None,
    )
    .await?;
    if !conflicts.is_empty() {
        metrics::counter!(crate::observability::CONFLICTS_TOTAL).increment(1);
        return Err(EngineError::Conflict(
            conflicts.into_iter().map(|b| b.id).collect(),
        ));
    }

    let booking = Booking {
        id: Ulid::new(),
        business_id: service.business_id,
        service_id,
        customer_id,
        staff_id,
        booking_time,
        duration_minutes: service.duration_minutes,
        price_cents: service.price_cents,
        payment_method,
        status: BookingStatus::Requested,
        notes,
        timestamps: StatusTimestamps::starting(BookingStatus::Requested, now),
    };
    engine.store.insert(booking.clone()).await?;
    drop(slot);

    info!(
        booking = %booking.id,
        business = %booking.business_id,
        "booking requested for {} ({} min)",
        booking.booking_time,
        booking.duration_minutes
    );
    engine.emit(&booking, BookingStatus::Requested, None);
    Ok(booking)
}

/// Accept / reject / complete: owner-gated transitions sharing one shape.
/// The ownership guard runs before the state-machine check, so a wrong
/// actor on a terminal booking still sees a denial, not a transition error.
async fn execute_owner_transition(
    engine: &Engine,
    booking_id: Ulid,
    actor_id: Ulid,
    target: BookingStatus,
    reason: Option<String>,
) -> Result<Booking, EngineError> {
    let booking = engine.store.get(booking_id).await?;
    guard::assert_owner(engine.catalog.as_ref(), booking.business_id, actor_id).await?;
    status::ensure_transition(booking.status, target)?;

    let updated = engine
        .store
        .update_status(booking_id, booking.status, target, engine.clock.now_ms())
        .await?;

    info!(booking = %booking_id, "booking {}", target);
    engine.emit(&updated, target, reason);
    Ok(updated)
}

async fn execute_cancel(
    engine: &Engine,
    booking_id: Ulid,
    actor_id: Ulid,
) -> Result<Booking, EngineError> {
    let booking = engine.store.get(booking_id).await?;
    guard::assert_customer_or_owner(engine.catalog.as_ref(), &booking, actor_id).await?;
    status::ensure_transition(booking.status, BookingStatus::Cancelled)?;

    let updated = engine
        .store
        .update_status(
            booking_id,
            booking.status,
            BookingStatus::Cancelled,
            engine.clock.now_ms(),
        )
        .await?;

    info!(booking = %booking_id, "booking cancelled");
    engine.emit(&updated, BookingStatus::Cancelled, None);
    Ok(updated)
}
