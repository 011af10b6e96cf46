use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::{Booking, BookingStatus, BusinessRef, Ms, ServiceRef};

/// Persistence boundary for bookings.
///
/// `update_status` is an atomic conditional update: the swap happens only
/// when the stored status equals `expected`, so two actors racing to
/// transition the same booking cannot both succeed. Implementations backed
/// by real infrastructure may surface retryable failures as
/// `EngineError::TransientStore`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<(), EngineError>;

    async fn get(&self, id: Ulid) -> Result<Booking, EngineError>;

    /// Compare-and-set the status, recording the transition instant under
    /// the new status's timestamp key. A stale `expected` fails with
    /// `InvalidTransition { from: <actual>, .. }`.
    async fn update_status(
        &self,
        id: Ulid,
        expected: BookingStatus,
        new_status: BookingStatus,
        now: Ms,
    ) -> Result<Booking, EngineError>;

    /// Bookings for a business whose status is in `status_in`.
    ///
    /// With `staff_id = Some(s)` the result is restricted to bookings
    /// assigned to `s` or unassigned; unassigned bookings consume shared
    /// business capacity and are visible to every staff-scoped query.
    async fn query(
        &self,
        business_id: Ulid,
        staff_id: Option<Ulid>,
        status_in: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError>;
}

/// Read-only lookups owned by the external catalog subsystem.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_business(&self, id: Ulid) -> Result<BusinessRef, EngineError>;

    async fn get_service(&self, id: Ulid) -> Result<ServiceRef, EngineError>;
}

/// DashMap-backed reference store. Entry-level exclusive access supplies
/// the conditional-update atomicity.
#[derive(Default)]
pub struct MemoryStore {
    bookings: DashMap<Ulid, Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert(&self, booking: Booking) -> Result<(), EngineError> {
        if self.bookings.contains_key(&booking.id) {
            return Err(EngineError::Validation("duplicate booking id"));
        }
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.bookings
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn update_status(
        &self,
        id: Ulid,
        expected: BookingStatus,
        new_status: BookingStatus,
        now: Ms,
    ) -> Result<Booking, EngineError> {
        let mut entry = self.bookings.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        if entry.status != expected {
            return Err(EngineError::InvalidTransition {
                from: entry.status,
                to: new_status,
            });
        }
        entry.apply_transition(new_status, now);
        Ok(entry.clone())
    }

    async fn query(
        &self,
        business_id: Ulid,
        staff_id: Option<Ulid>,
        status_in: &[BookingStatus],
    ) -> Result<Vec<Booking>, EngineError> {
        Ok(self
            .bookings
            .iter()
            .filter(|e| e.business_id == business_id)
            .filter(|e| status_in.contains(&e.status))
            .filter(|e| match staff_id {
                Some(s) => e.staff_id.is_none() || e.staff_id == Some(s),
                None => true,
            })
            .map(|e| e.value().clone())
            .collect())
    }
}

/// In-memory catalog for tests and single-process deployments.
#[derive(Default)]
pub struct StaticCatalog {
    businesses: DashMap<Ulid, BusinessRef>,
    services: DashMap<Ulid, ServiceRef>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_business(&self, business: BusinessRef) {
        self.businesses.insert(business.id, business);
    }

    pub fn put_service(&self, service: ServiceRef) {
        self.services.insert(service.id, service);
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn get_business(&self, id: Ulid) -> Result<BusinessRef, EngineError> {
        self.businesses
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }

    async fn get_service(&self, id: Ulid) -> Result<ServiceRef, EngineError> {
        self.services
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))
    }
}
