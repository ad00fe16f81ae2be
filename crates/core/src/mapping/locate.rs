//! Discovery of the newest DSM spreadsheet in a directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

static DSM_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^dsm-(\d{2})(\d{2})\.xlsx$").expect("Invalid DSM filename regex"));

/// Parse `dsm-MMDD.xlsx` into `(month, day)`.
fn parse_stamp(file_name: &str) -> Option<(u32, u32)> {
    let caps = DSM_FILE.captures(file_name)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((month, day))
}

/// Find the `dsm-MMDD.xlsx` file with the latest month/day in `dir`.
pub fn locate_latest_dsm(dir: &Path) -> Result<PathBuf, Error> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::DataSource(format!("failed to list {}: {e}", dir.display())))?;

    let mut latest: Option<((u32, u32), PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stamp) = parse_stamp(name) else {
            if name.starts_with("dsm-") {
                tracing::debug!(file = name, "ignoring file without a valid dsm-MMDD.xlsx name");
            }
            continue;
        };
        if latest.as_ref().is_none_or(|(best, _)| stamp > *best) {
            latest = Some((stamp, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::DataSource(format!("no dsm-MMDD.xlsx file found in {}", dir.display())))
}
