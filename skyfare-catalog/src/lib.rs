pub mod capacity;
pub mod catalog;

pub use capacity::{CapacityError, CapacityLedger};
pub use catalog::MemoryCatalog;
