use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Ms,
    pub end: Ms,
}

impl Window {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Half-open overlap: a window ending exactly when another starts does
    /// not overlap it.
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Lifecycle status of a booking. Exactly one at any time; transitions only
/// along the edges in `engine::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Accepted,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// Statuses that occupy a time slot.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Requested, BookingStatus::Accepted];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Key under which the transition instant is recorded, e.g. `accepted_at`.
    pub fn timestamp_key(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested_at",
            BookingStatus::Accepted => "accepted_at",
            BookingStatus::Rejected => "rejected_at",
            BookingStatus::Cancelled => "cancelled_at",
            BookingStatus::Completed => "completed_at",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Requested | BookingStatus::Accepted)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer intends to pay. Snapshotted at creation; the engine
/// attaches no behavior to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Online,
}

/// Append-only record of status-entry instants, in insertion order.
///
/// Each status is recorded at most once; re-recording is a no-op. Instants
/// are clamped to be non-decreasing even if the injected clock steps back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTimestamps(Vec<(BookingStatus, Ms)>);

impl StatusTimestamps {
    pub fn starting(status: BookingStatus, at: Ms) -> Self {
        Self(vec![(status, at)])
    }

    /// Record the instant `status` was entered. Write-once per status.
    pub fn record(&mut self, status: BookingStatus, at: Ms) {
        if self.get(status).is_some() {
            return;
        }
        let at = at.max(self.last_at().unwrap_or(at));
        self.0.push((status, at));
    }

    pub fn get(&self, status: BookingStatus) -> Option<Ms> {
        self.0.iter().find(|(s, _)| *s == status).map(|(_, at)| *at)
    }

    pub fn last_at(&self) -> Option<Ms> {
        self.0.last().map(|(_, at)| *at)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(BookingStatus, Ms)> {
        self.0.iter()
    }
}

/// A single reservation of a service slot, governed by the lifecycle
/// state machine. Mutated only through `BookingStore::update_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub business_id: Ulid,
    pub service_id: Ulid,
    pub customer_id: Ulid,
    /// Assigned worker; `None` means any staff (shared business capacity).
    pub staff_id: Option<Ulid>,
    /// Scheduled start instant.
    pub booking_time: Ms,
    /// Copied from the service at creation — later service edits must not
    /// retroactively alter existing bookings.
    pub duration_minutes: u32,
    /// Minor currency units, snapshotted at creation.
    pub price_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub timestamps: StatusTimestamps,
}

impl Booking {
    /// The occupied slot as a half-open window.
    pub fn window(&self) -> Window {
        Window::new(
            self.booking_time,
            self.booking_time + self.duration_minutes as Ms * MINUTE_MS,
        )
    }

    /// Swap status and record the transition instant. Callers are expected
    /// to have validated the edge; the store's conditional update is the
    /// only mutation path.
    pub(crate) fn apply_transition(&mut self, new_status: BookingStatus, at: Ms) {
        self.status = new_status;
        self.timestamps.record(new_status, at);
    }
}

/// External catalog record for a business. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRef {
    pub id: Ulid,
    pub owner_id: Ulid,
    pub name: String,
}

/// External catalog record for a service. Read-only here; price and
/// duration are snapshotted onto bookings at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: Ulid,
    pub business_id: Ulid,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub is_active: bool,
}

/// Payload handed to notification sinks after a committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Snapshot of the booking after the transition.
    pub booking: Booking,
    pub status: BookingStatus,
    /// Instant the status was entered.
    pub at: Ms,
    /// Populated for rejections only; never stored on the booking.
    pub reason: Option<String>,
}

impl StatusChange {
    pub fn new(booking: Booking, status: BookingStatus, reason: Option<String>) -> Self {
        let at = booking.timestamps.get(status).unwrap_or_default();
        Self {
            booking,
            status,
            at,
            reason,
        }
    }
}
