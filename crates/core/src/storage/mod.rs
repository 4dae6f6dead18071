//! Named-disk storage registry built on Apache OpenDAL.
//!
//! The redemption pipeline needs exactly four operations from storage:
//! existence, a streaming read, deletion, and a MIME type. Everything is
//! keyed by a logical disk name so one deployment can serve several roots
//! or buckets.

mod error;
mod service;
mod stream;

pub use error::StorageError;
pub use service::{FileInfo, StorageService};
pub use stream::{CleanupHandle, DeleteOnComplete};
