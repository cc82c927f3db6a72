//! Client session for the streamcal api: incremental month loading for a
//! calendar view, an HTTP client with timeout and retry, a session event bus
//! and a background task queue.

pub mod api;
pub mod bus;
pub mod month_cache;
pub mod tasks;
pub mod viewport;

pub use api::{ApiClient, ClientConfig};
pub use bus::{ClientEvent, EventBus};
pub use month_cache::MonthCache;
pub use tasks::BackgroundQueue;
pub use viewport::{CalendarSync, Clock, RangeFetcher, ViewKind, ViewportOutcome, ViewportReport};
