use ulid::Ulid;

use crate::limits::*;
use crate::model::{Booking, BookingStatus, Window};
use crate::store::BookingStore;

use super::EngineError;

pub(crate) fn validate_window(window: &Window) -> Result<(), EngineError> {
    if window.start < MIN_VALID_TIMESTAMP_MS || window.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::Validation("timestamp out of range"));
    }
    Ok(())
}

/// Staff-scope policy: a booking with no assigned staff consumes shared
/// business capacity, so it collides with everything at the business; two
/// bookings assigned to different staff never collide.
pub(crate) fn staff_scope_overlaps(candidate: Option<Ulid>, existing: Option<Ulid>) -> bool {
    match (candidate, existing) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b,
    }
}

/// Every active (`requested`/`accepted`) booking whose window overlaps the
/// candidate window under the staff-scope policy. The full set is returned
/// so callers can report all colliding bookings at once.
pub async fn find_conflicts(
    store: &dyn BookingStore,
    business_id: Ulid,
    staff_id: Option<Ulid>,
    window: Window,
    exclude_booking_id: Option<Ulid>,
) -> Result<Vec<Booking>, EngineError> {
    let candidates = store
        .query(business_id, staff_id, &BookingStatus::ACTIVE)
        .await?;

    let mut conflicts: Vec<Booking> = candidates
        .into_iter()
        .filter(|b| Some(b.id) != exclude_booking_id)
        .filter(|b| staff_scope_overlaps(staff_id, b.staff_id))
        .filter(|b| b.window().overlaps(&window))
        .collect();
    conflicts.sort_by_key(|b| b.booking_time);
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PaymentMethod, StatusTimestamps, MINUTE_MS};
    use crate::store::MemoryStore;

    fn booking(
        business_id: Ulid,
        staff_id: Option<Ulid>,
        start: i64,
        minutes: u32,
        status: BookingStatus,
    ) -> Booking {
        Booking {
            id: Ulid::new(),
            business_id,
            service_id: Ulid::new(),
            customer_id: Ulid::new(),
            staff_id,
            booking_time: start,
            duration_minutes: minutes,
            price_cents: 1_000,
            payment_method: PaymentMethod::Cash,
            status,
            notes: None,
            timestamps: StatusTimestamps::starting(BookingStatus::Requested, 0),
        }
    }

    async fn seeded(bookings: Vec<Booking>) -> MemoryStore {
        let store = MemoryStore::new();
        for b in bookings {
            store.insert(b).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn overlapping_active_booking_is_reported() {
        let biz = Ulid::new();
        let existing = booking(biz, None, 14 * 60 * MINUTE_MS, 60, BookingStatus::Requested);
        let existing_id = existing.id;
        let store = seeded(vec![existing]).await;

        // 14:30 + 60min overlaps 14:00 + 60min
        let window = Window::new(
            14 * 60 * MINUTE_MS + 30 * MINUTE_MS,
            15 * 60 * MINUTE_MS + 30 * MINUTE_MS,
        );
        let conflicts = find_conflicts(&store, biz, None, window, None).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, existing_id);
    }

    #[tokio::test]
    async fn back_to_back_windows_do_not_conflict() {
        let biz = Ulid::new();
        let store = seeded(vec![booking(biz, None, 0, 60, BookingStatus::Accepted)]).await;

        // Starts exactly where the other ends.
        let window = Window::new(60 * MINUTE_MS, 120 * MINUTE_MS);
        let conflicts = find_conflicts(&store, biz, None, window, None).await.unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn terminal_bookings_do_not_block_the_slot() {
        let biz = Ulid::new();
        let store = seeded(vec![
            booking(biz, None, 0, 60, BookingStatus::Rejected),
            booking(biz, None, 0, 60, BookingStatus::Cancelled),
            booking(biz, None, 0, 60, BookingStatus::Completed),
        ])
        .await;

        let conflicts = find_conflicts(&store, biz, None, Window::new(0, 60 * MINUTE_MS), None)
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn different_staff_share_the_hour() {
        let biz = Ulid::new();
        let staff_a = Ulid::new();
        let staff_b = Ulid::new();
        let store = seeded(vec![booking(
            biz,
            Some(staff_a),
            0,
            60,
            BookingStatus::Accepted,
        )])
        .await;

        let window = Window::new(0, 60 * MINUTE_MS);
        let conflicts = find_conflicts(&store, biz, Some(staff_b), window, None)
            .await
            .unwrap();
        assert!(conflicts.is_empty());

        let same_staff = find_conflicts(&store, biz, Some(staff_a), window, None)
            .await
            .unwrap();
        assert_eq!(same_staff.len(), 1);
    }

    #[tokio::test]
    async fn unassigned_collides_with_everyone() {
        let biz = Ulid::new();
        let staff = Ulid::new();
        let store = seeded(vec![
            booking(biz, Some(staff), 0, 60, BookingStatus::Accepted),
            booking(biz, None, 90 * MINUTE_MS, 30, BookingStatus::Requested),
        ])
        .await;

        // Unassigned candidate spanning both existing bookings.
        let window = Window::new(0, 120 * MINUTE_MS);
        let conflicts = find_conflicts(&store, biz, None, window, None).await.unwrap();
        assert_eq!(conflicts.len(), 2);

        // Staff-assigned candidate still collides with the unassigned booking.
        let staff_window = Window::new(90 * MINUTE_MS, 110 * MINUTE_MS);
        let conflicts = find_conflicts(&store, biz, Some(Ulid::new()), staff_window, None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
    }

    #[tokio::test]
    async fn exclusion_skips_the_booking_itself() {
        let biz = Ulid::new();
        let existing = booking(biz, None, 0, 60, BookingStatus::Accepted);
        let id = existing.id;
        let store = seeded(vec![existing]).await;

        let conflicts = find_conflicts(&store, biz, None, Window::new(0, 60 * MINUTE_MS), Some(id))
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn full_conflict_set_sorted_by_start() {
        let biz = Ulid::new();
        let later = booking(biz, None, 120 * MINUTE_MS, 60, BookingStatus::Requested);
        let earlier = booking(biz, None, 30 * MINUTE_MS, 60, BookingStatus::Accepted);
        let store = seeded(vec![later.clone(), earlier.clone()]).await;

        let window = Window::new(0, 180 * MINUTE_MS);
        let conflicts = find_conflicts(&store, biz, None, window, None).await.unwrap();
        let ids: Vec<Ulid> = conflicts.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![earlier.id, later.id]);
    }

    #[test]
    fn window_bounds_checked() {
        assert!(validate_window(&Window::new(0, 1000)).is_ok());
        assert!(validate_window(&Window::new(-5, 1000)).is_err());
        assert!(validate_window(&Window::new(0, MAX_VALID_TIMESTAMP_MS + 1)).is_err());
    }
}
