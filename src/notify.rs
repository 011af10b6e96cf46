use std::sync::{Arc, RwLock};

use tracing::{debug, error, info};

use crate::model::{BookingStatus, StatusChange};

/// A downstream channel for status changes (email, SMS, business alert).
/// Sinks are best-effort: a failure is logged and counted, never allowed to
/// affect the already-committed transition.
pub trait BookingObserver: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_status_change(&self, change: &StatusChange) -> Result<(), SinkError>;
}

#[derive(Debug)]
pub struct SinkError(pub String);

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sink error: {}", self.0)
    }
}

impl std::error::Error for SinkError {}

/// Explicit observer registry. Built once at process start with the sinks a
/// deployment wants; `notify` fans out synchronously in registration order,
/// inside the call that committed the mutation.
#[derive(Default)]
pub struct NotificationDispatcher {
    observers: RwLock<Vec<Arc<dyn BookingObserver>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_sinks() -> Self {
        let dispatcher = Self::new();
        dispatcher.register(Arc::new(EmailNotifier));
        dispatcher.register(Arc::new(SmsNotifier));
        dispatcher.register(Arc::new(BusinessAlertNotifier));
        dispatcher
    }

    pub fn register(&self, observer: Arc<dyn BookingObserver>) {
        let mut observers = self.observers.write().expect("observer registry poisoned");
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            debug!("observer {} already registered", observer.name());
            return;
        }
        debug!("observer {} registered", observer.name());
        observers.push(observer);
    }

    pub fn unregister(&self, observer: &Arc<dyn BookingObserver>) {
        let mut observers = self.observers.write().expect("observer registry poisoned");
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        if observers.len() == before {
            debug!("observer {} was not registered", observer.name());
        } else {
            debug!("observer {} unregistered", observer.name());
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().expect("observer registry poisoned").len()
    }

    /// Fan the change out to every registered observer, in order.
    pub fn notify(&self, change: &StatusChange) {
        let observers = self.observers.read().expect("observer registry poisoned");
        debug!(
            booking = %change.booking.id,
            status = %change.status,
            payload = %serde_json::to_string(change).unwrap_or_default(),
            "notifying {} observers",
            observers.len()
        );
        for observer in observers.iter() {
            match observer.on_status_change(change) {
                Ok(()) => {
                    metrics::counter!(crate::observability::NOTIFICATIONS_TOTAL).increment(1);
                }
                Err(e) => {
                    metrics::counter!(crate::observability::NOTIFICATION_FAILURES_TOTAL)
                        .increment(1);
                    error!(
                        booking = %change.booking.id,
                        sink = observer.name(),
                        "notification sink failed: {e}"
                    );
                }
            }
        }
    }
}

fn customer_message(change: &StatusChange) -> String {
    let business = change.booking.business_id;
    match change.status {
        BookingStatus::Requested => {
            format!("Your booking request at business {business} has been submitted.")
        }
        BookingStatus::Accepted => {
            format!("Your booking at business {business} has been accepted.")
        }
        BookingStatus::Rejected => match &change.reason {
            Some(reason) => format!(
                "Your booking at business {business} has been rejected: {reason}"
            ),
            None => format!("Your booking at business {business} has been rejected."),
        },
        BookingStatus::Cancelled => {
            format!("Your booking at business {business} has been cancelled.")
        }
        BookingStatus::Completed => {
            format!("Your service at business {business} is complete. Thank you!")
        }
    }
}

/// Email sink. Delivery itself lives outside this crate; the sink renders
/// the customer-facing copy and hands it to the log/transport layer.
pub struct EmailNotifier;

impl BookingObserver for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn on_status_change(&self, change: &StatusChange) -> Result<(), SinkError> {
        let subject = format!("Booking {}", change.status);
        info!(
            channel = "email",
            customer = %change.booking.customer_id,
            booking = %change.booking.id,
            subject = %subject,
            "{}",
            customer_message(change)
        );
        Ok(())
    }
}

/// SMS sink. Same contract as email with shorter copy.
pub struct SmsNotifier;

impl BookingObserver for SmsNotifier {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn on_status_change(&self, change: &StatusChange) -> Result<(), SinkError> {
        info!(
            channel = "sms",
            customer = %change.booking.customer_id,
            booking = %change.booking.id,
            "Booking {} at business {}",
            change.status,
            change.booking.business_id
        );
        Ok(())
    }
}

/// Owner-facing sink: only the statuses a business must react to.
pub struct BusinessAlertNotifier;

impl BookingObserver for BusinessAlertNotifier {
    fn name(&self) -> &'static str {
        "business-alert"
    }

    fn on_status_change(&self, change: &StatusChange) -> Result<(), SinkError> {
        let subject = match change.status {
            BookingStatus::Requested => "New booking request",
            BookingStatus::Cancelled => "Booking cancelled",
            _ => return Ok(()),
        };
        info!(
            channel = "business-alert",
            business = %change.booking.business_id,
            booking = %change.booking.id,
            customer = %change.booking.customer_id,
            "{subject} for {}",
            change.booking.booking_time
        );
        Ok(())
    }
}
