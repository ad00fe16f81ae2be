//! Host to site-root table.
//!
//! Each public host of the site being migrated lives under a named root in the
//! target CMS tree. Hosts outside the table fall back to their first label.

use url::Url;

/// Known hosts and the CMS root they migrate into.
pub const SITE_ROOTS: &[(&str, &str)] = &[
    ("web.musc.edu", "Enterprise"),
    ("muschealth.org", "Health"),
    ("education.musc.edu", "Education"),
    ("research.musc.edu", "Research"),
    ("hollingscancercenter.musc.edu", "Hollings"),
    ("musckids.org", "Kids"),
    ("dentistry.musc.edu", "Dental Medicine"),
    ("giving.musc.edu", "Giving"),
    ("gradstudies.musc.edu", "Graduate Studies"),
    ("chp.musc.edu", "Health Professions"),
    ("medicine.musc.edu", "Medicine"),
    ("nursing.musc.edu", "Nursing"),
    ("pharmacy.musc.edu", "Pharmacy"),
];

/// Root used when a URL has no host at all.
pub const FALLBACK_ROOT: &str = "Sites";

fn bare_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Whether `host` is one of the known site hosts. A `www.` prefix is ignored.
pub fn is_known_host(host: &str) -> bool {
    let host = bare_host(host);
    SITE_ROOTS.iter().any(|(known, _)| *known == host)
}

/// Site root for a host.
pub fn root_for_host(host: &str) -> String {
    let host = bare_host(host);
    if host.is_empty() {
        return FALLBACK_ROOT.to_string();
    }
    SITE_ROOTS
        .iter()
        .find(|(known, _)| *known == host)
        .map(|(_, root)| root.to_string())
        .unwrap_or_else(|| host.split('.').next().unwrap_or(FALLBACK_ROOT).to_string())
}

/// Site root for a URL string; unparsable URLs get [`FALLBACK_ROOT`].
pub fn root_for_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(root_for_host))
        .unwrap_or_else(|| FALLBACK_ROOT.to_string())
}
