pub mod backend;
pub mod memory_backend;
pub mod redis_backend;
pub mod topics;

pub use backend::{PendingEntry, StreamBackend, StreamEntry, StreamStats};
