//! Whitelist of DSM domains.
//!
//! The set of domains is fixed here rather than discovered from the workbook,
//! so stray or misspelled sheet names are ignored.

use crate::Error;

/// Column header holding the page's current URL.
pub const EXISTING_URL_COLUMN: &str = "Existing URL";
/// Column header holding the planned path on the new site.
pub const PROPOSED_URL_COLUMN: &str = "Proposed URL";

/// Layout of one domain's worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSpec {
    /// Canonical domain name.
    pub name: &'static str,
    /// Worksheet name in the workbook.
    pub worksheet: &'static str,
    /// 0-based physical row holding the column headers. Data starts on the next row.
    pub header_row: usize,
    pub aliases: &'static [&'static str],
    pub existing_column: &'static str,
    pub proposed_column: &'static str,
}

impl DomainSpec {
    const fn standard(name: &'static str, header_row: usize) -> Self {
        Self {
            name,
            worksheet: name,
            header_row,
            aliases: &[],
            existing_column: EXISTING_URL_COLUMN,
            proposed_column: PROPOSED_URL_COLUMN,
        }
    }

    const fn with_aliases(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    /// 1-based spreadsheet row number of the first data row.
    pub fn first_data_row(&self) -> u32 {
        self.header_row as u32 + 2
    }

    fn answers_to(&self, wanted: &str) -> bool {
        normalize_name(self.name) == wanted || self.aliases.iter().any(|alias| normalize_name(alias) == wanted)
    }
}

pub const DOMAINS: &[DomainSpec] = &[
    DomainSpec::standard("Enterprise", 3),
    DomainSpec::standard("Adult Health", 2),
    DomainSpec::standard("Education", 3),
    DomainSpec::standard("Research", 3),
    DomainSpec::standard("Hollings Cancer", 3).with_aliases(&["Hollings Cancer Center", "HCC", "Hollings"]),
    DomainSpec::standard("Childrens Health", 3).with_aliases(&["Children's Health", "Kids", "Children's"]),
    DomainSpec::standard("CDM", 3),
    DomainSpec::standard("MUSC Giving", 3),
    DomainSpec::standard("CGS", 3),
    DomainSpec::standard("CHP", 3),
    DomainSpec::standard("COM", 3),
    DomainSpec::standard("CON", 3),
    DomainSpec::standard("COP", 3),
    DomainSpec {
        name: "News Releases",
        worksheet: "News Releases",
        header_row: 0,
        aliases: &["News"],
        existing_column: "Current URLs",
        proposed_column: "Path",
    },
    DomainSpec {
        name: "Progress Notes",
        worksheet: "ProgressNotes",
        header_row: 0,
        aliases: &["ProgressNotes"],
        existing_column: EXISTING_URL_COLUMN,
        proposed_column: PROPOSED_URL_COLUMN,
    },
];

/// Lowercase and collapse internal whitespace.
pub(crate) fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Canonical names of every whitelisted domain, in whitelist order.
pub fn domain_names() -> Vec<String> {
    DOMAINS.iter().map(|d| d.name.to_string()).collect()
}

/// Resolve user input to a whitelisted domain, ignoring case and extra whitespace.
pub fn resolve_domain(input: &str) -> Result<&'static DomainSpec, Error> {
    let wanted = normalize_name(input);
    DOMAINS
        .iter()
        .find(|spec| spec.answers_to(&wanted))
        .ok_or_else(|| Error::UnknownDomain { name: input.trim().to_string(), valid: domain_names() })
}

/// Whitelisted domain whose worksheet is named `sheet`, if any.
pub fn domain_for_sheet(sheet: &str) -> Option<&'static DomainSpec> {
    let wanted = normalize_name(sheet);
    DOMAINS.iter().find(|spec| normalize_name(spec.worksheet) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let lower = resolve_domain("education").unwrap();
        let upper = resolve_domain("EDUCATION").unwrap();
        assert_eq!(lower.name, "Education");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_resolve_alias_and_whitespace() {
        assert_eq!(resolve_domain("hcc").unwrap().name, "Hollings Cancer");
        assert_eq!(resolve_domain("  adult   health ").unwrap().name, "Adult Health");
        assert_eq!(resolve_domain("kids").unwrap().name, "Childrens Health");
    }

    #[test]
    fn test_unknown_domain_lists_alternatives() {
        let err = resolve_domain("Educaton").unwrap_err();
        match err {
            Error::UnknownDomain { name, valid } => {
                assert_eq!(name, "Educaton");
                assert_eq!(valid.len(), DOMAINS.len());
                assert!(valid.contains(&"Education".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_data_row() {
        assert_eq!(resolve_domain("Education").unwrap().first_data_row(), 5);
        assert_eq!(resolve_domain("Adult Health").unwrap().first_data_row(), 4);
        assert_eq!(resolve_domain("News Releases").unwrap().first_data_row(), 2);
    }

    #[test]
    fn test_domain_for_sheet() {
        assert_eq!(domain_for_sheet("progressnotes").unwrap().name, "Progress Notes");
        assert!(domain_for_sheet("Sheet1").is_none());
    }
}
