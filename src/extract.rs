use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, sync::Arc};

use crate::classify::{Classifier, CodeType};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static CPT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{5}\b").expect("valid CPT regex"));
static HCPCS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][0-9]{4}\b").expect("valid HCPCS regex"));
static PLA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{4}[A-Z]\b").expect("valid PLA regex"));

impl CodeType {
    fn pattern(self) -> &'static Regex {
        match self {
            CodeType::Cpt => &CPT_PATTERN,
            CodeType::Hcpcs => &HCPCS_PATTERN,
            CodeType::Pla => &PLA_PATTERN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCode {
    pub code: String,
    pub code_type: CodeType,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub timestamp: String,
}

impl fmt::Display for ExtractedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.code_type, self.description)
    }
}

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Unique matches of one family's pattern, in first-seen order.
pub fn find_codes(text: &str, code_type: CodeType) -> Vec<&str> {
    let mut seen = HashSet::new();
    code_type
        .pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|code| seen.insert(*code))
        .collect()
}

#[derive(Clone)]
pub struct CodeExtractor {
    classifier: Arc<Classifier>,
}

impl CodeExtractor {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn extract_cpt<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<ExtractedCode> {
        self.extract_family(text.into(), CodeType::Cpt, &now_timestamp())
    }

    pub fn extract_hcpcs<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<ExtractedCode> {
        self.extract_family(text.into(), CodeType::Hcpcs, &now_timestamp())
    }

    pub fn extract_pla<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<ExtractedCode> {
        self.extract_family(text.into(), CodeType::Pla, &now_timestamp())
    }

    /// Every family over the same text, CPT first, then HCPCS, then PLA.
    /// Codes are unique within a family; families are not merged.
    pub fn extract_all<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<ExtractedCode> {
        let text = text.into();
        if text.is_none_or(str::is_empty) {
            return Vec::new();
        }
        let timestamp = now_timestamp();
        CodeType::ALL
            .into_iter()
            .flat_map(|code_type| self.extract_family(text, code_type, &timestamp))
            .collect()
    }

    fn extract_family(
        &self,
        text: Option<&str>,
        code_type: CodeType,
        timestamp: &str,
    ) -> Vec<ExtractedCode> {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Vec::new();
        };

        find_codes(text, code_type)
            .into_iter()
            .map(|code| {
                let info = self.classifier.classify_as(code, code_type);
                ExtractedCode {
                    code: code.to_string(),
                    code_type,
                    category: info.category,
                    subcategory: info.subcategory,
                    description: info.description,
                    timestamp: timestamp.to_string(),
                }
            })
            .collect()
    }
}
