use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    cache::{CacheKey, ClassificationCache, MemoryCache},
    ranges::{CODE_RANGES, CodeRange},
};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_FOUND_DESCRIPTION: &str = "Not found in lookup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeType {
    #[serde(rename = "CPT")]
    Cpt,
    #[serde(rename = "HCPCS")]
    Hcpcs,
    #[serde(rename = "PLA")]
    Pla,
}

impl CodeType {
    pub const ALL: [CodeType; 3] = [CodeType::Cpt, CodeType::Hcpcs, CodeType::Pla];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::Cpt => "CPT",
            CodeType::Hcpcs => "HCPCS",
            CodeType::Pla => "PLA",
        }
    }

    /// Family implied by the shape of an already-uppercased code.
    pub fn infer(code: &str) -> Self {
        let bytes = code.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), _) if first.is_ascii_uppercase() => CodeType::Hcpcs,
            (Some(first), Some(last)) if first.is_ascii_digit() && last.is_ascii_uppercase() => {
                CodeType::Pla
            }
            _ => CodeType::Cpt,
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub subcategory: String,
    pub description: String,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            category: UNKNOWN.to_string(),
            subcategory: UNKNOWN.to_string(),
            description: NOT_FOUND_DESCRIPTION.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

impl From<&CodeRange> for Classification {
    fn from(range: &CodeRange) -> Self {
        Self {
            category: range.category.to_string(),
            subcategory: range.subcategory.to_string(),
            description: range.description.to_string(),
        }
    }
}

/// Range-table lookup with a memo in front of it.
///
/// The table is scanned in order and the first band containing the code wins,
/// even when a later band is narrower. Letter-led codes compare lexically,
/// all-digit codes compare as integers, and PLA-shaped codes (`0001U`)
/// compare lexically against the non-numeric bands only. Any other digit-led
/// input is Unknown.
pub struct Classifier {
    table: &'static [CodeRange],
    cache: Box<dyn ClassificationCache>,
    scans: AtomicUsize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_parts(CODE_RANGES, Box::new(MemoryCache::default()))
    }

    pub fn with_cache(cache: Box<dyn ClassificationCache>) -> Self {
        Self::with_parts(CODE_RANGES, cache)
    }

    pub fn with_parts(table: &'static [CodeRange], cache: Box<dyn ClassificationCache>) -> Self {
        Self {
            table,
            cache,
            scans: AtomicUsize::new(0),
        }
    }

    pub fn classify(&self, code: &str) -> Classification {
        let normalized = code.to_ascii_uppercase();
        let code_type = CodeType::infer(&normalized);
        self.lookup(code_type, normalized)
    }

    pub fn classify_as(&self, code: &str, code_type: CodeType) -> Classification {
        self.lookup(code_type, code.to_ascii_uppercase())
    }

    /// Number of times the range table has been scanned (cache misses).
    pub fn table_scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    fn lookup(&self, code_type: CodeType, code: String) -> Classification {
        let key = CacheKey { code_type, code };
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let classification = self
            .find_range(&key.code)
            .map(Classification::from)
            .unwrap_or_else(Classification::unknown);
        self.cache.put(key, classification.clone());
        classification
    }

    fn find_range(&self, code: &str) -> Option<&'static CodeRange> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let table = self.table;

        if code.starts_with(|c: char| c.is_ascii_uppercase()) {
            return table
                .iter()
                .find(|range| range.low <= code && code <= range.high);
        }

        match code.parse::<u64>() {
            Ok(value) => table.iter().find(|range| match range.numeric_bounds() {
                Some((low, high)) => low <= value && value <= high,
                None => {
                    tracing::trace!(
                        low = range.low,
                        high = range.high,
                        "Skipping non-numeric band for numeric code {code}"
                    );
                    false
                }
            }),
            Err(_) if is_pla_shaped(code) => table.iter().find(|range| {
                range.numeric_bounds().is_none() && range.low <= code && code <= range.high
            }),
            Err(_) => None,
        }
    }
}

/// Four ASCII digits followed by one uppercase letter.
fn is_pla_shaped(code: &str) -> bool {
    match code.as_bytes() {
        [digits @ .., last] if digits.len() == 4 => {
            digits.iter().all(u8::is_ascii_digit) && last.is_ascii_uppercase()
        }
        _ => false,
    }
}
