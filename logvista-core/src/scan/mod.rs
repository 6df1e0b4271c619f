mod result;
mod scanner;

#[cfg(test)]
mod tests;

pub use result::{ScanError, ScanResult};
pub use scanner::{DEFAULT_BATCH_SIZE, Scanner};
