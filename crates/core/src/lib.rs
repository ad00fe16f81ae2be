//! Core types and shared functionality for linker.
//!
//! This crate provides:
//! - The page snapshot data model
//! - Unified error types
//! - Layered configuration
//! - JSON snapshot cache
//! - The migration mapping index over the DSM workbook

pub mod cache;
pub mod config;
pub mod error;
pub mod mapping;
pub mod sites;
pub mod snapshot;

pub use cache::{CacheIdentity, SnapshotCache};
pub use config::AppConfig;
pub use error::Error;
pub use mapping::{DomainSpec, MappingIndex, MappingPair, MigrationRow, UrlMatch};
pub use snapshot::{EmbedKind, EmbedRecord, LinkRecord, PageSnapshot, SidebarContent, UNCHECKED_STATUS};
