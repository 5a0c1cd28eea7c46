//! The lock file: reading a previous snapshot and writing the next one.

mod lock_manager;
mod locker;

pub use lock_manager::LockManager;
pub use locker::{compute_content_hash, LockData, Locker};
