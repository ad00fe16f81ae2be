//! Reading DSM worksheets into plain string grids.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use super::domains::domain_for_sheet;
use crate::Error;

/// One worksheet as physical rows of cell text, starting at spreadsheet row 1.
///
/// Blank cells are empty strings; short rows are not padded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string slices; handy for fixtures.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self { rows: rows.iter().map(|row| row.iter().map(|c| c.to_string()).collect()).collect() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Physical row by 0-based index.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let (row_offset, col_offset) = range.start().map(|(r, c)| (r as usize, c as usize)).unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    SheetGrid::new(rows)
}

/// Read every whitelisted worksheet of the workbook at `path`.
///
/// Sheets that are not in the domain whitelist are skipped.
pub fn read_workbook(path: &Path) -> Result<HashMap<String, SheetGrid>, Error> {
    if !path.is_file() {
        return Err(Error::DataSource(format!("spreadsheet not found: {}", path.display())));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::DataSource(format!("failed to open {}: {e}", path.display())))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = HashMap::new();

    for name in names {
        if domain_for_sheet(&name).is_none() {
            tracing::debug!(sheet = %name, "skipping sheet outside the domain whitelist");
            continue;
        }
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| Error::DataSource(format!("failed to read sheet '{name}': {e}")))?;
        sheets.insert(name, grid_from_range(&range));
    }

    tracing::debug!(path = %path.display(), sheets = sheets.len(), "read workbook");
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("x".into())), "x");
        assert_eq!(cell_text(&Data::Float(42.0)), "42");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
    }

    #[test]
    fn test_grid_from_offset_range() {
        let mut range = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Existing URL".into()));
        range.set_value((2, 2), Data::String("Proposed URL".into()));
        range.set_value((3, 1), Data::String("https://a.test/x".into()));

        let grid = grid_from_range(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid.row(0).unwrap().is_empty());
        assert_eq!(grid.row(2).unwrap(), ["", "Existing URL", "Proposed URL"]);
        assert_eq!(grid.row(3).unwrap(), ["", "https://a.test/x", ""]);
    }

    #[test]
    fn test_read_missing_workbook() {
        let result = read_workbook(Path::new("/definitely/not/here/dsm-0101.xlsx"));
        assert!(matches!(result, Err(Error::DataSource(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_read_unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dsm-0101.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let result = read_workbook(&path);
        assert!(matches!(result, Err(Error::DataSource(_))));
    }
}
