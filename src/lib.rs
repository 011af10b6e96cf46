pub mod clock;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{BookingCommand, CommandInvoker, Engine, EngineError};
pub use model::{Booking, BookingStatus, StatusChange, Window};
pub use notify::{BookingObserver, NotificationDispatcher};
pub use store::{BookingStore, Catalog, MemoryStore, StaticCatalog};
