use chrono::Local;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::{CodeExtractor, ExtractedCode};

pub const PROCESSED_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum LineOfBusiness {
    #[default]
    Medicare,
    Medicaid,
    Commercial,
    Marketplace,
    Other,
}

impl LineOfBusiness {
    pub fn as_str(self) -> &'static str {
        match self {
            LineOfBusiness::Medicare => "Medicare",
            LineOfBusiness::Medicaid => "Medicaid",
            LineOfBusiness::Commercial => "Commercial",
            LineOfBusiness::Marketplace => "Marketplace",
            LineOfBusiness::Other => "Other",
        }
    }
}

impl fmt::Display for LineOfBusiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields attached to every code found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub payer: String,
    pub plan: String,
    pub year: i32,
    pub line_of_business: LineOfBusiness,
    pub processed_date: String,
}

impl DocumentMetadata {
    pub fn new(
        file_name: impl Into<String>,
        payer: impl Into<String>,
        plan: impl Into<String>,
        year: i32,
        line_of_business: LineOfBusiness,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            payer: payer.into(),
            plan: plan.into(),
            year,
            line_of_business,
            processed_date: Local::now().format(PROCESSED_DATE_FORMAT).to_string(),
        }
    }
}

/// One exported row: an extracted code with its document's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    #[serde(flatten)]
    pub code: ExtractedCode,
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
}

impl CodeRecord {
    pub fn new(code: ExtractedCode, metadata: &DocumentMetadata) -> Self {
        Self {
            code,
            metadata: metadata.clone(),
        }
    }
}

/// Append-only list of rows gathered during one working session.
///
/// Implementations are not synchronized; share one behind a lock.
pub trait SessionStore {
    fn append(&mut self, records: Vec<CodeRecord>);
    fn records(&self) -> &[CodeRecord];
    fn clear(&mut self);

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct InMemorySession {
    records: Vec<CodeRecord>,
}

impl SessionStore for InMemorySession {
    fn append(&mut self, records: Vec<CodeRecord>) {
        self.records.extend(records);
    }

    fn records(&self) -> &[CodeRecord] {
        &self.records
    }

    fn clear(&mut self) {
        self.records.clear();
    }
}

/// Extracts codes from one document's text, stamps them with `metadata`, and
/// appends them to `session`. Returns the rows added by this document.
pub fn process_document(
    extractor: &CodeExtractor,
    session: &mut dyn SessionStore,
    metadata: &DocumentMetadata,
    text: Option<&str>,
) -> Vec<CodeRecord> {
    let records: Vec<CodeRecord> = extractor
        .extract_all(text)
        .into_iter()
        .map(|code| CodeRecord::new(code, metadata))
        .collect();
    session.append(records.clone());
    records
}
