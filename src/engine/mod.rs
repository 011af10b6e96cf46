pub mod availability;
mod command;
pub mod conflict;
mod error;
pub mod guard;
mod invoker;
pub mod status;

pub use command::BookingCommand;
pub use error::EngineError;
pub use invoker::{CommandInvoker, CommandOutcome, FailedCommand, HistoryEntry};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::clock::Clock;
use crate::model::{Booking, BookingStatus, StatusChange};
use crate::notify::NotificationDispatcher;
use crate::store::{BookingStore, Catalog};

/// The collaborators every command executes against, bundled once at
/// process start. Commands themselves are pure inputs; all state lives
/// behind these interfaces.
pub struct Engine {
    pub store: Arc<dyn BookingStore>,
    pub catalog: Arc<dyn Catalog>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
    /// One lock per business serializes the conflict-check + insert pair on
    /// the create path, so two racing creations cannot both claim an
    /// overlapping slot. Durable stores can replace this with a transaction.
    create_locks: DashMap<Ulid, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        catalog: Arc<dyn Catalog>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            dispatcher,
            clock,
            create_locks: DashMap::new(),
        }
    }

    pub(super) fn create_lock(&self, business_id: Ulid) -> Arc<Mutex<()>> {
        self.create_locks
            .entry(business_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fan a committed transition out to the registered sinks. Best-effort:
    /// the mutation is already persisted, so sink failures stay inside the
    /// dispatcher.
    pub(super) fn emit(&self, booking: &Booking, status: BookingStatus, reason: Option<String>) {
        let change = StatusChange::new(booking.clone(), status, reason);
        self.dispatcher.notify(&change);
    }
}
