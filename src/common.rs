use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use std::path::Path;

use crate::constants::EARLIEST_DOCUMENT_YEAR;

pub fn truncate_for_log(text: &str) -> String {
    let trimmed = text.trim();
    let max_len = 300usize;
    match trimmed.char_indices().nth(max_len) {
        None => trimmed.to_string(),
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Document years run from 2020 through the current year.
pub fn validate_year(year: i32) -> Result<i32> {
    let latest = current_year();
    if !(EARLIEST_DOCUMENT_YEAR..=latest).contains(&year) {
        bail!("Year {year} is out of range ({EARLIEST_DOCUMENT_YEAR}-{latest})");
    }
    Ok(year)
}

pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|x| x.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
