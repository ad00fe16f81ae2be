//! Link reconciliation against the migration mapping.
//!
//! Each link of a snapshot is classified as internal or external to the site
//! under migration. Internal links are looked up in one domain's mapping
//! table by path; a miss is reported as unmapped, not as an error.

use serde::Serialize;
use url::{Host, Url};

use linker_core::mapping::resolve_domain;
use linker_core::sites::is_known_host;
use linker_core::{Error, LinkRecord, MappingIndex, PageSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    Internal,
    External,
}

/// Reconciliation outcome for one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationEntry {
    pub link: LinkRecord,
    pub scope: LinkScope,
    /// Whether a mapping row was found. Always false for external links.
    pub mapped: bool,
    pub proposed_path: Option<String>,
    /// Spreadsheet row of the match.
    pub row_number: Option<u32>,
}

impl ReconciliationEntry {
    pub fn is_internal(&self) -> bool {
        self.scope == LinkScope::Internal
    }

    pub fn is_unmapped(&self) -> bool {
        self.is_internal() && !self.mapped
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub total_internal: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub external: usize,
}

impl ReconciliationSummary {
    pub fn from_entries(entries: &[ReconciliationEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            match (entry.scope, entry.mapped) {
                (LinkScope::External, _) => acc.external += 1,
                (LinkScope::Internal, true) => {
                    acc.total_internal += 1;
                    acc.mapped += 1;
                }
                (LinkScope::Internal, false) => {
                    acc.total_internal += 1;
                    acc.unmapped += 1;
                }
            }
            acc
        })
    }
}

/// Annotated links of one snapshot for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Canonical domain name.
    pub domain: String,
    pub entries: Vec<ReconciliationEntry>,
    pub summary: ReconciliationSummary,
}

/// Registrable part of a host per the public suffix list (`bbc.co.uk` for
/// `www.bbc.co.uk`). IP addresses and hosts that are themselves a suffix are
/// kept whole.
pub fn registrable_domain(host: &Host<&str>) -> String {
    match host {
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_ascii_lowercase();
            psl::domain_str(&name).map(str::to_string).unwrap_or(name)
        }
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    }
}

/// Decides which links belong to the site under migration.
#[derive(Debug, Clone)]
pub struct SiteScope {
    site: Option<String>,
    extra_hosts: Vec<String>,
}

impl SiteScope {
    /// Scope anchored at the host of `page_url`, plus explicit extra hosts.
    pub fn new(page_url: &str, extra_hosts: &[String]) -> Self {
        let site = Url::parse(page_url).ok().and_then(|u| u.host().map(|h| registrable_domain(&h)));
        Self { site, extra_hosts: extra_hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect() }
    }

    /// Classify a resolved href. Links without a host (mailto, tel) are external.
    pub fn classify(&self, href: &str) -> LinkScope {
        let Ok(url) = Url::parse(href) else {
            return LinkScope::External;
        };
        let Some(host) = url.host() else {
            return LinkScope::External;
        };

        let name = host.to_string().to_ascii_lowercase();
        let same_site = self.site.as_deref() == Some(registrable_domain(&host).as_str());
        if same_site || is_known_host(&name) || self.extra_hosts.contains(&name) {
            LinkScope::Internal
        } else {
            LinkScope::External
        }
    }
}

/// Reconcile every link of `snapshot` against one domain of `index`.
///
/// Fails only when `domain` is not a whitelisted domain.
pub fn reconcile(
    snapshot: &PageSnapshot,
    index: &MappingIndex,
    domain: &str,
    extra_hosts: &[String],
) -> Result<Reconciliation, Error> {
    let spec = resolve_domain(domain)?;
    let page_url = snapshot.final_url.as_deref().unwrap_or(&snapshot.source_url);
    let scope = SiteScope::new(page_url, extra_hosts);

    let mut entries = Vec::with_capacity(snapshot.links.len());
    for link in &snapshot.links {
        let link_scope = scope.classify(&link.href);
        let row = match link_scope {
            LinkScope::Internal => index.find_in_domain(spec.name, &link.href)?,
            LinkScope::External => None,
        };
        tracing::debug!(href = %link.href, scope = ?link_scope, mapped = row.is_some(), "reconciled link");
        entries.push(ReconciliationEntry {
            link: link.clone(),
            scope: link_scope,
            mapped: row.is_some(),
            proposed_path: row.map(|r| r.proposed_path.clone()),
            row_number: row.map(|r| r.row_number),
        });
    }

    let summary = ReconciliationSummary::from_entries(&entries);
    Ok(Reconciliation { domain: spec.name.to_string(), entries, summary })
}
