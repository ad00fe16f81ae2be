//! Migration mapping index over the DSM workbook.
//!
//! The DSM spreadsheet holds one worksheet per domain. Each worksheet has a
//! fixed header row a few rows below the top, followed by data rows with an
//! "Existing URL" and a "Proposed URL" column. This module provides:
//!
//! - The fixed domain whitelist with aliases and per-sheet layout
//! - Workbook reading via calamine
//! - A typed index keyed by `(domain, row)` plus reverse lookup by URL
//! - Discovery of the newest `dsm-MMDD.xlsx` file

pub mod domains;
pub mod index;
pub mod locate;
pub mod matching;
pub mod workbook;

pub use domains::{DOMAINS, DomainSpec, domain_names, resolve_domain};
pub use index::{MappingIndex, MappingPair, MigrationRow, UrlMatch};
pub use locate::locate_latest_dsm;
pub use matching::MatchKey;
pub use workbook::SheetGrid;
