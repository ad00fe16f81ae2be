//! Client code for linker.
//!
//! This crate provides the page analysis pipeline (normalize, fetch, extract,
//! status check), link reconciliation against the DSM mapping, report
//! assembly and the interactive [`Session`] used by the CLI.

pub mod extract;
pub mod fetch;
pub mod reconcile;
pub mod report;
pub mod session;

pub use extract::{ContentExtractor, ExtractConfig, ParsedPage, parse_page};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, HttpStatusResolver, StatusCheck, normalize_url};
pub use reconcile::{LinkScope, Reconciliation, ReconciliationEntry, ReconciliationSummary, reconcile};
pub use report::{Report, ReportContext, build_report, render_html, write_report};
pub use session::Session;
