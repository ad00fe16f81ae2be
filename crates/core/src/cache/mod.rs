//! File-backed cache for page snapshots.
//!
//! Each snapshot is stored as one pretty-printed JSON document in the cache
//! directory. It supports:
//!
//! - Filesystem-safe keys derived from the source identity (URL or DSM row)
//! - Lossless round-trips of [`PageSnapshot`](crate::PageSnapshot)
//! - Async access via tokio::fs
//! - Removal of single entries or the whole cache

pub mod key;
pub mod store;

pub use crate::Error;

pub use key::{CacheIdentity, cache_key};
pub use store::{CachedSnapshot, SnapshotCache};
