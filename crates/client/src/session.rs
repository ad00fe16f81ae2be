//! Interactive session state.
//!
//! A [`Session`] carries what used to be ambient state between commands: the
//! current URL and selector, the loaded DSM row, the mapping index and the
//! last snapshot. The mapping index is shared behind an `Arc` and replaced
//! wholesale on reload, never mutated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use linker_core::mapping::locate_latest_dsm;
use linker_core::{AppConfig, CacheIdentity, Error, MappingIndex, MappingPair, PageSnapshot, SnapshotCache, UrlMatch};

use crate::extract::ContentExtractor;
use crate::fetch::normalize_url;
use crate::reconcile::{Reconciliation, reconcile};
use crate::report::{Report, ReportContext, build_report, report_file_name, write_report};

/// Where `check` got its snapshot from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Fetched,
    Cached,
}

pub struct Session {
    config: AppConfig,
    extractor: ContentExtractor,
    cache: SnapshotCache,
    url: Option<String>,
    selector: String,
    domain: Option<String>,
    row: Option<u32>,
    existing_url: Option<String>,
    proposed_path: Option<String>,
    mapping: Option<Arc<MappingIndex>>,
    snapshot: Option<PageSnapshot>,
}

impl Session {
    pub fn new(config: AppConfig, extractor: ContentExtractor, cache: SnapshotCache) -> Self {
        let selector = config.selector.clone();
        Self {
            config,
            extractor,
            cache,
            url: None,
            selector,
            domain: None,
            row: None,
            existing_url: None,
            proposed_path: None,
            mapping: None,
            snapshot: None,
        }
    }

    /// Build a session with HTTP clients and the cache directory from `config`.
    pub async fn from_config(config: AppConfig) -> Result<Self, Error> {
        let extractor = ContentExtractor::from_config(&config)?;
        let cache = SnapshotCache::open(&config.cache_dir).await?;
        Ok(Self::new(config, extractor, cache))
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn row(&self) -> Option<u32> {
        self.row
    }

    pub fn proposed_path(&self) -> Option<&str> {
        self.proposed_path.as_deref()
    }

    pub fn snapshot(&self) -> Option<&PageSnapshot> {
        self.snapshot.as_ref()
    }

    /// Point the session at a URL outside the DSM. Clears the loaded row.
    pub fn set_url(&mut self, url: &str) -> Result<(), Error> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::MalformedInput("URL must not be empty".into()));
        }
        self.url = Some(url.to_string());
        self.domain = None;
        self.row = None;
        self.existing_url = None;
        self.snapshot = None;
        Ok(())
    }

    pub fn set_selector(&mut self, selector: &str) -> Result<(), Error> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(Error::MalformedInput("selector must not be empty".into()));
        }
        self.selector = selector.to_string();
        self.snapshot = None;
        Ok(())
    }

    pub fn set_proposed_path(&mut self, path: &str) {
        let path = path.trim();
        self.proposed_path = (!path.is_empty()).then(|| path.to_string());
    }

    /// The loaded mapping index.
    pub fn mapping(&self) -> Result<&Arc<MappingIndex>, Error> {
        self.mapping.as_ref().ok_or(Error::NoMappingLoaded)
    }

    /// Swap in a new mapping index.
    pub fn replace_mapping(&mut self, index: MappingIndex) -> Arc<MappingIndex> {
        let index = Arc::new(index);
        self.mapping = Some(Arc::clone(&index));
        index
    }

    /// Workbook path: `path` if given, else the configured file, else the
    /// newest `dsm-MMDD.xlsx` in the DSM directory.
    fn workbook_path(&self, path: Option<&Path>) -> Result<PathBuf, Error> {
        match path.or(self.config.dsm_file.as_deref()) {
            Some(path) => Ok(path.to_path_buf()),
            None => locate_latest_dsm(&self.config.dsm_dir),
        }
    }

    /// Load a workbook and replace the current mapping with it.
    ///
    /// On failure the previous mapping, if any, stays in place.
    pub async fn load_workbook(&mut self, path: Option<&Path>) -> Result<Arc<MappingIndex>, Error> {
        let path = self.workbook_path(path)?;
        tracing::info!(path = %path.display(), "loading DSM workbook");

        let index = tokio::task::spawn_blocking(move || MappingIndex::open(&path))
            .await
            .map_err(|e| Error::DataSource(format!("workbook loader failed: {e}")))??;

        Ok(self.replace_mapping(index))
    }

    async fn ensure_mapping(&mut self) -> Result<Arc<MappingIndex>, Error> {
        match &self.mapping {
            Some(index) => Ok(Arc::clone(index)),
            None => self.load_workbook(None).await,
        }
    }

    /// Load a DSM row into the session, making its existing URL current.
    ///
    /// A row without an existing URL (blank, out of range, or only a proposed
    /// path) is `RowNotFound` and leaves the session untouched.
    pub async fn load_mapping(&mut self, domain: &str, row: u32) -> Result<MappingPair, Error> {
        let index = self.ensure_mapping().await?;
        let spec = linker_core::mapping::resolve_domain(domain)?;
        let pair = index.load_mapping(spec.name, row)?;

        if pair.existing_url.is_empty() {
            tracing::info!(domain = spec.name, row, "DSM row has no existing URL");
            return Err(Error::RowNotFound { domain: spec.name.to_string(), row });
        }

        self.domain = Some(spec.name.to_string());
        self.row = Some(row);
        self.snapshot = None;
        self.url = Some(pair.existing_url.clone());
        self.existing_url = Some(pair.existing_url.clone());
        self.proposed_path = Some(pair.proposed_path.clone()).filter(|p| !p.is_empty());
        Ok(pair)
    }

    fn current_url(&self) -> Result<String, Error> {
        self.url
            .as_deref()
            .map(normalize_url)
            .ok_or_else(|| Error::MalformedInput("no URL set; use `set URL <url>` or `load <domain> <row>`".into()))
    }

    /// Cache identity of the current page: the DSM row when one is loaded,
    /// otherwise the URL.
    pub fn identity(&self) -> Result<CacheIdentity, Error> {
        match (&self.domain, self.row) {
            (Some(domain), Some(row)) => Ok(CacheIdentity::row(domain.clone(), row)),
            _ => Ok(CacheIdentity::url(self.current_url()?)),
        }
    }

    /// Fetch and analyze the current page, bypassing the cache.
    ///
    /// Successful snapshots are written to the cache.
    pub async fn analyze(&mut self) -> Result<&PageSnapshot, Error> {
        let url = self.current_url()?;
        let identity = self.identity()?;
        let snapshot = self.extractor.analyze(&url, &self.selector).await;

        if !snapshot.is_failed()
            && let Err(e) = self.cache.put(&identity, &snapshot).await
        {
            tracing::warn!(error = %e, "failed to cache snapshot");
        }

        Ok(self.snapshot.insert(snapshot))
    }

    /// Analyze the current page, reusing a cached snapshot taken with the
    /// same URL and selector unless `refresh` is set.
    pub async fn check(&mut self, refresh: bool) -> Result<(&PageSnapshot, SnapshotOrigin), Error> {
        let url = self.current_url()?;
        let identity = self.identity()?;

        if !refresh {
            match self.cache.get(&identity).await {
                Ok(Some(entry)) if entry.matches(&url, &self.selector) => {
                    tracing::debug!(key = %entry.key, "using cached snapshot");
                    return Ok((self.snapshot.insert(entry.snapshot), SnapshotOrigin::Cached));
                }
                Ok(Some(entry)) => tracing::debug!(key = %entry.key, "cached snapshot is for another URL or selector"),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable cache entry"),
            }
        }

        let snapshot = self.analyze().await?;
        Ok((snapshot, SnapshotOrigin::Fetched))
    }

    fn require_snapshot(&self) -> Result<&PageSnapshot, Error> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| Error::MalformedInput("no page analyzed yet; run `check` first".into()))
    }

    /// Reconcile the current snapshot against the loaded domain.
    pub fn reconcile(&self) -> Result<Reconciliation, Error> {
        let snapshot = self.require_snapshot()?;
        let index = self.mapping()?;
        let domain = self
            .domain
            .as_deref()
            .ok_or_else(|| Error::MalformedInput("no domain loaded; use `load <domain> <row>`".into()))?;
        reconcile(snapshot, index, domain, &self.config.internal_hosts)
    }

    /// Find which DSM row, in any domain, lists `url` as its existing URL.
    pub fn lookup(&self, url: &str) -> Result<Option<UrlMatch>, Error> {
        Ok(self.mapping()?.find_by_url(&normalize_url(url.trim())))
    }

    /// Every `(header, value)` pair of the loaded DSM row.
    pub fn row_cells(&self) -> Result<Vec<(String, String)>, Error> {
        let (Some(domain), Some(row)) = (self.domain.as_deref(), self.row) else {
            return Err(Error::MalformedInput("no DSM row loaded; use `load <domain> <row>`".into()));
        };
        self.mapping()?.row_cells(domain, row)
    }

    fn report_context(&self) -> ReportContext<'_> {
        ReportContext {
            domain: self.domain.as_deref(),
            row: self.row,
            existing_url: self.existing_url.as_deref(),
            proposed_path: self.proposed_path.as_deref(),
        }
    }

    /// Assemble the report for the current snapshot.
    ///
    /// Reconciliation is included when a mapping and domain are loaded.
    pub fn build_report(&self) -> Result<Report, Error> {
        let snapshot = self.require_snapshot()?;
        let reconciliation = match (&self.mapping, &self.domain) {
            (Some(_), Some(_)) => Some(self.reconcile()?),
            _ => None,
        };
        Ok(build_report(snapshot, reconciliation.as_ref(), &self.report_context()))
    }

    /// Build the report and write it to the reports directory.
    pub async fn write_report(&self) -> Result<PathBuf, Error> {
        let report = self.build_report()?;
        let file_name = report_file_name(&self.report_context(), &report.source.url);
        write_report(&report, &self.config.reports_dir, &file_name).await
    }

    /// Delete every cached snapshot.
    pub async fn clear_cache(&self) -> Result<u64, Error> {
        self.cache.purge_all().await
    }
}
