pub mod base;
pub mod file_backend;
pub mod memory_backend;
pub mod mongodb_backend;
pub mod no_backend;
pub mod snapshot;

// Re-export the primary Backend items so code outside can do
// "use crate::backend::{Backend, Snapshot, create_backend};"
pub use base::{create_backend, Backend, BackendError, Connection};
pub use snapshot::Snapshot;
