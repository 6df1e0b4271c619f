mod app;
mod store;
pub mod tracing;

pub use app::{TestApp, log_line};
pub use store::CountingStore;
pub use tracing::{CapturedEvent, captured_events, init_test_tracing};
