//! The global weakly-held event dispatch bus (`bus`), and the event catalog
//! that flows through it (`types`).

mod bus;
mod types;

pub use bus::{BusError, EventBus, Subscriber};
pub use types::{Event, EventType};
