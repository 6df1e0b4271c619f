pub mod cli;
pub mod clock;
pub mod conf;
pub mod cursor;
pub mod enrichment;
pub mod event;
pub mod logging;
pub mod scan;
pub mod server;
pub mod site;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
