mod scheduler;
mod setup;


pub use scheduler::{PassSummary, run_periodic_scans, run_scan_pass};
pub use setup::{App, build_app_with, open_store, run, run_until_cancelled};
