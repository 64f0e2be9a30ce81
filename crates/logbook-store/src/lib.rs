//! Log repositories for Logbook.
//!
//! This crate provides the concrete [`LogRepository`](logbook_core::LogRepository)
//! implementations:
//!
//! - [`MemoryLogRepository`]: Thread-safe in-process store with a capacity cap
//! - [`FileLogRepository`]: JSON-lines file replayed into memory on open
//! - [`RetentionPolicy`]: Age-based deletion of old entries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod file;
pub mod memory;
pub mod retention;

pub use file::{FileLogRepository, FileStoreConfig};
pub use memory::{MemoryLogRepository, MemoryStoreConfig};
pub use retention::RetentionPolicy;
