use ulid::Ulid;

use crate::model::Booking;
use crate::store::Catalog;

use super::EngineError;

/// Second-layer authorization: the boundary already did a role check, but
/// the command re-verifies ownership against the catalog record so a
/// misconfigured boundary cannot leak a mutation. Must run before the
/// state-machine check.
pub async fn assert_owner(
    catalog: &dyn Catalog,
    business_id: Ulid,
    actor_id: Ulid,
) -> Result<(), EngineError> {
    let business = catalog.get_business(business_id).await?;
    if business.owner_id != actor_id {
        return Err(EngineError::Unauthorized);
    }
    Ok(())
}

/// Cancellation is open to the booking's customer or the owning business.
pub async fn assert_customer_or_owner(
    catalog: &dyn Catalog,
    booking: &Booking,
    actor_id: Ulid,
) -> Result<(), EngineError> {
    if booking.customer_id == actor_id {
        return Ok(());
    }
    let business = catalog.get_business(booking.business_id).await?;
    if business.owner_id == actor_id {
        return Ok(());
    }
    Err(EngineError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BookingStatus, BusinessRef, PaymentMethod, StatusTimestamps,
    };
    use crate::store::StaticCatalog;

    fn catalog_with_business(owner_id: Ulid) -> (StaticCatalog, Ulid) {
        let catalog = StaticCatalog::new();
        let business_id = Ulid::new();
        catalog.put_business(BusinessRef {
            id: business_id,
            owner_id,
            name: "Shear Genius".into(),
        });
        (catalog, business_id)
    }

    fn booking_for(business_id: Ulid, customer_id: Ulid) -> Booking {
        Booking {
            id: Ulid::new(),
            business_id,
            service_id: Ulid::new(),
            customer_id,
            staff_id: None,
            booking_time: 0,
            duration_minutes: 30,
            price_cents: 900,
            payment_method: PaymentMethod::Cash,
            status: BookingStatus::Requested,
            notes: None,
            timestamps: StatusTimestamps::starting(BookingStatus::Requested, 0),
        }
    }

    #[tokio::test]
    async fn owner_passes() {
        let owner = Ulid::new();
        let (catalog, business_id) = catalog_with_business(owner);
        assert_owner(&catalog, business_id, owner).await.unwrap();
    }

    #[tokio::test]
    async fn stranger_denied_without_detail() {
        let (catalog, business_id) = catalog_with_business(Ulid::new());
        let err = assert_owner(&catalog, business_id, Ulid::new())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Unauthorized);
        // Generic denial: the message must not leak the owner identity.
        assert_eq!(err.to_string(), "not authorized");
    }

    #[tokio::test]
    async fn missing_business_is_not_found() {
        let catalog = StaticCatalog::new();
        let id = Ulid::new();
        let err = assert_owner(&catalog, id, Ulid::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn cancel_guard_accepts_customer_and_owner() {
        let owner = Ulid::new();
        let customer = Ulid::new();
        let (catalog, business_id) = catalog_with_business(owner);
        let booking = booking_for(business_id, customer);

        assert_customer_or_owner(&catalog, &booking, customer)
            .await
            .unwrap();
        assert_customer_or_owner(&catalog, &booking, owner)
            .await
            .unwrap();

        let err = assert_customer_or_owner(&catalog, &booking, Ulid::new())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Unauthorized);
    }
}
