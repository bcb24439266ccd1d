//! Concrete adapters for the domain ports.

pub mod in_memory;
pub mod log_notifier;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod sandbox_gateway;
