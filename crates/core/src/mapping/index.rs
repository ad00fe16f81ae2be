//! The typed migration mapping index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::domains::{DOMAINS, DomainSpec, normalize_name, resolve_domain};
use super::matching::MatchKey;
use super::workbook::{SheetGrid, read_workbook};
use crate::Error;

static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s,;]+").expect("Invalid URL extraction regex"));

/// One planned migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRow {
    /// Canonical domain name.
    pub domain: String,
    /// 1-based spreadsheet row number.
    pub row_number: u32,
    pub existing_url: String,
    pub proposed_path: String,
    /// The existing-URL cell listed more than one URL; only the first is kept.
    pub has_multiple_urls: bool,
}

/// The `(existing URL, proposed path)` pair for a row.
///
/// Both fields are empty when the row is blank or out of range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingPair {
    pub existing_url: String,
    pub proposed_path: String,
}

impl MappingPair {
    pub fn is_empty(&self) -> bool {
        self.existing_url.is_empty() && self.proposed_path.is_empty()
    }
}

impl From<&MigrationRow> for MappingPair {
    fn from(row: &MigrationRow) -> Self {
        Self { existing_url: row.existing_url.clone(), proposed_path: row.proposed_path.clone() }
    }
}

/// Result of a reverse lookup by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlMatch {
    pub domain: String,
    pub row: MigrationRow,
}

/// Split an existing-URL cell into the URL to keep and a multiple-URL flag.
fn clean_existing_url(cell: &str) -> (String, bool) {
    let mut found = HTTP_URL.find_iter(cell);
    match found.next() {
        Some(first) => (first.as_str().to_string(), found.next().is_some()),
        None => (cell.trim().to_string(), false),
    }
}

/// Match keys for each URL listed in an existing-URL cell.
fn cell_keys(cell: &str) -> Vec<MatchKey> {
    let urls: Vec<&str> = HTTP_URL.find_iter(cell).map(|m| m.as_str()).collect();
    if urls.is_empty() {
        return MatchKey::parse(cell).into_iter().collect();
    }
    urls.into_iter().filter_map(MatchKey::parse).collect()
}

/// Index of the header matching `wanted`, ignoring case and extra whitespace.
fn column_index(headers: &[String], wanted: &str) -> Option<usize> {
    let wanted = normalize_name(wanted);
    headers.iter().position(|h| normalize_name(h) == wanted)
}

fn cell(row: &[String], index: Option<usize>) -> &str {
    index.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
}

/// One domain's worksheet, resolved once at load time.
#[derive(Debug, Clone)]
struct DomainTable {
    spec: &'static DomainSpec,
    headers: Vec<String>,
    /// Physical data rows following the header row.
    data: Vec<Vec<String>>,
    /// Parsed rows aligned with `data`; None for blank rows.
    rows: Vec<Option<MigrationRow>>,
    /// Match keys for every URL in each row's existing-URL cell.
    keys: Vec<Vec<MatchKey>>,
}

impl DomainTable {
    fn empty(spec: &'static DomainSpec) -> Self {
        Self { spec, headers: Vec::new(), data: Vec::new(), rows: Vec::new(), keys: Vec::new() }
    }

    fn build(spec: &'static DomainSpec, grid: &SheetGrid) -> Self {
        let headers = grid.row(spec.header_row).map(<[String]>::to_vec).unwrap_or_default();

        let existing_col = column_index(&headers, spec.existing_column);
        let proposed_col = column_index(&headers, spec.proposed_column);
        for (col, wanted) in [(existing_col, spec.existing_column), (proposed_col, spec.proposed_column)] {
            if col.is_none() {
                tracing::warn!(domain = spec.name, column = wanted, "column missing from sheet, values will be empty");
            }
        }

        let data: Vec<Vec<String>> = grid.rows().iter().skip(spec.header_row + 1).cloned().collect();
        let first_row = spec.first_data_row();
        let mut multiple = 0usize;

        let rows: Vec<Option<MigrationRow>> = data
            .iter()
            .enumerate()
            .map(|(offset, cells)| {
                if cells.iter().all(|c| c.trim().is_empty()) {
                    return None;
                }
                let (existing_url, has_multiple_urls) = clean_existing_url(cell(cells, existing_col));
                if has_multiple_urls {
                    multiple += 1;
                }
                Some(MigrationRow {
                    domain: spec.name.to_string(),
                    row_number: first_row + offset as u32,
                    existing_url,
                    proposed_path: cell(cells, proposed_col).to_string(),
                    has_multiple_urls,
                })
            })
            .collect();

        if multiple > 0 {
            tracing::warn!(domain = spec.name, rows = multiple, "existing URL cells with multiple URLs, using the first");
        }

        let keys = data
            .iter()
            .zip(&rows)
            .map(|(cells, row)| match row {
                Some(_) => cell_keys(cell(cells, existing_col)),
                None => Vec::new(),
            })
            .collect();

        Self { spec, headers, data, rows, keys }
    }

    fn offset_of(&self, row_number: u32) -> Option<usize> {
        row_number.checked_sub(self.spec.first_data_row()).map(|o| o as usize)
    }

    fn get(&self, row_number: u32) -> Option<&MigrationRow> {
        self.offset_of(row_number).and_then(|o| self.rows.get(o)).and_then(Option::as_ref)
    }

    fn populated(&self) -> impl Iterator<Item = &MigrationRow> {
        self.rows.iter().flatten()
    }

    fn find(&self, key: &MatchKey, same: impl Fn(&MatchKey, &MatchKey) -> bool) -> Option<&MigrationRow> {
        self.rows
            .iter()
            .zip(&self.keys)
            .find_map(|(row, entries)| match row {
                Some(row) if entries.iter().any(|entry| same(key, entry)) => Some(row),
                _ => None,
            })
    }
}

/// Read-only view over a DSM workbook, keyed by `(domain, row)`.
///
/// Built once per spreadsheet; reloading builds a new index.
#[derive(Debug, Clone)]
pub struct MappingIndex {
    source: Option<PathBuf>,
    tables: Vec<DomainTable>,
}

impl MappingIndex {
    /// Load the workbook at `path`.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let sheets = read_workbook(path)?;
        let mut index = Self::from_sheets(&sheets);
        index.source = Some(path.to_path_buf());
        Ok(index)
    }

    /// Build an index from already-read worksheets keyed by sheet name.
    ///
    /// Whitelisted domains without a matching sheet get an empty table.
    pub fn from_sheets(sheets: &HashMap<String, SheetGrid>) -> Self {
        let tables: Vec<DomainTable> = DOMAINS
            .iter()
            .map(|spec| {
                let wanted = normalize_name(spec.worksheet);
                match sheets.iter().find(|(name, _)| normalize_name(name) == wanted) {
                    Some((_, grid)) => DomainTable::build(spec, grid),
                    None => {
                        tracing::warn!(domain = spec.name, sheet = spec.worksheet, "sheet missing from workbook");
                        DomainTable::empty(spec)
                    }
                }
            })
            .collect();

        let counts: Vec<String> =
            tables.iter().map(|t| format!("{}={}", t.spec.name, t.populated().count())).collect();
        tracing::info!(rows = %counts.join(", "), "loaded migration mapping");

        Self { source: None, tables }
    }

    /// Path the index was loaded from, if it came from a file.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn table(&self, domain: &str) -> Result<&DomainTable, Error> {
        let spec = resolve_domain(domain)?;
        self.tables
            .iter()
            .find(|t| t.spec.name == spec.name)
            .ok_or_else(|| Error::DataSource(format!("domain '{}' has no table", spec.name)))
    }

    /// Look up a row. Returns None when the row is blank or out of range.
    pub fn lookup(&self, domain: &str, row: u32) -> Result<Option<&MigrationRow>, Error> {
        Ok(self.table(domain)?.get(row))
    }

    /// Like [`lookup`](Self::lookup) but a missing row is an error.
    pub fn require(&self, domain: &str, row: u32) -> Result<&MigrationRow, Error> {
        let table = self.table(domain)?;
        table
            .get(row)
            .ok_or_else(|| Error::RowNotFound { domain: table.spec.name.to_string(), row })
    }

    /// The `(existing URL, proposed path)` pair for a row.
    ///
    /// A blank or out-of-range row yields an empty pair.
    pub fn load_mapping(&self, domain: &str, row: u32) -> Result<MappingPair, Error> {
        Ok(self.lookup(domain, row)?.map(MappingPair::from).unwrap_or_default())
    }

    /// Every populated row of a domain, in sheet order.
    pub fn rows(&self, domain: &str) -> Result<Vec<&MigrationRow>, Error> {
        Ok(self.table(domain)?.populated().collect())
    }

    /// Every `(header, value)` pair of a row. Headers without a name are skipped.
    pub fn row_cells(&self, domain: &str, row: u32) -> Result<Vec<(String, String)>, Error> {
        let table = self.table(domain)?;
        table.get(row).ok_or_else(|| Error::RowNotFound { domain: table.spec.name.to_string(), row })?;

        let cells = table.offset_of(row).and_then(|o| table.data.get(o)).map(Vec::as_slice).unwrap_or(&[]);
        Ok(table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.trim().is_empty())
            .map(|(i, header)| (header.trim().to_string(), cell(cells, Some(i)).to_string()))
            .collect())
    }

    /// Find the first row of `domain` whose existing URL has the same path as `url`.
    ///
    /// Scheme and host are ignored.
    pub fn find_in_domain(&self, domain: &str, url: &str) -> Result<Option<&MigrationRow>, Error> {
        let table = self.table(domain)?;
        Ok(MatchKey::parse(url).and_then(|key| table.find(&key, MatchKey::same_page)))
    }

    /// Search every domain, in whitelist order, for a row whose existing URL
    /// points at `url`. The first match wins.
    pub fn find_by_url(&self, url: &str) -> Option<UrlMatch> {
        let key = MatchKey::parse(url)?;
        self.tables.iter().find_map(|table| {
            table
                .find(&key, MatchKey::same_location)
                .map(|row| UrlMatch { domain: table.spec.name.to_string(), row: row.clone() })
        })
    }
}
