use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use csv::Writer;
use std::{fmt::Display, fs, io::Write, path::Path};

use crate::session::CodeRecord;

pub const CSV_COLUMNS: [&str; 11] = [
    "code",
    "code_type",
    "category",
    "subcategory",
    "description",
    "file_name",
    "payer",
    "plan",
    "year",
    "line_of_business",
    "timestamp",
];

pub fn default_export_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "extracted_codes_with_metadata_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    )
}

pub fn write_csv<W: Write>(out: W, records: &[CodeRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer
        .write_record(CSV_COLUMNS)
        .context("Failed writing CSV header")?;

    for record in records {
        let year = record.metadata.year.to_string();
        writer
            .write_record([
                record.code.code.as_str(),
                record.code.code_type.as_str(),
                record.code.category.as_str(),
                record.code.subcategory.as_str(),
                record.code.description.as_str(),
                record.metadata.file_name.as_str(),
                record.metadata.payer.as_str(),
                record.metadata.plan.as_str(),
                year.as_str(),
                record.metadata.line_of_business.as_str(),
                record.code.timestamp.as_str(),
            ])
            .with_context(|| format!("Failed writing CSV row for {}", record.code.code))?;
    }

    writer.flush().context("Failed flushing CSV writer")?;
    Ok(())
}

pub fn csv_string(records: &[CodeRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    String::from_utf8(buf).context("CSV output was not UTF-8")
}

/// Writes through a `.tmp` sibling so a partial export never replaces a good one.
pub fn write_csv_file(path: &Path, records: &[CodeRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("extracted_codes.csv");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed creating export {}", tmp_path.display()))?;
    let written = write_csv(file, records).and_then(|()| {
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed moving export {} to {}",
                tmp_path.display(),
                path.display()
            )
        })
    });
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::Classifier,
        extract::CodeExtractor,
        session::{DocumentMetadata, InMemorySession, LineOfBusiness, SessionStore, process_document},
    };
    use chrono::Utc;
    use std::sync::Arc;

    fn session_with(text: &str) -> InMemorySession {
        let extractor = CodeExtractor::new(Arc::new(Classifier::new()));
        let mut session = InMemorySession::default();
        let metadata = DocumentMetadata::new(
            "policy.pdf",
            "Acme, Inc.",
            "Gold",
            2023,
            LineOfBusiness::Medicaid,
        );
        process_document(&extractor, &mut session, &metadata, Some(text));
        session
    }

    #[test]
    fn empty_session_writes_header_only() {
        let csv = csv_string(&[]).expect("csv");
        assert_eq!(csv, format!("{}\n", CSV_COLUMNS.join(",")));
    }

    #[test]
    fn rows_follow_column_order() {
        let session = session_with("A0428");
        let csv = csv_string(session.records()).expect("csv");
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().expect("headers").clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_COLUMNS);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[0], "A0428");
        assert_eq!(&row[1], "HCPCS");
        assert_eq!(&row[3], "Transportation Services");
        assert_eq!(&row[6], "Acme, Inc.");
        assert_eq!(&row[8], "2023");
        assert_eq!(&row[9], "Medicaid");
        assert_eq!(&row[10], &session.records()[0].code.timestamp);
    }

    #[test]
    fn file_export_replaces_tmp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("codes.csv");
        let session = session_with("99213 0001U");

        write_csv_file(&path, session.records()).expect("write");
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written.lines().count(), 3);
        assert!(!path.with_file_name("codes.csv.tmp").exists());
    }

    #[test]
    fn failed_export_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a non-empty directory cannot be replaced by the rename
        let path = dir.path().join("codes.csv");
        fs::create_dir(&path).expect("mkdir");
        fs::write(path.join("keep"), "x").expect("write");
        let session = session_with("99213");

        assert!(write_csv_file(&path, session.records()).is_err());
        assert!(!dir.path().join("codes.csv.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn default_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            default_export_file_name(&now),
            "extracted_codes_with_metadata_20240305_140709.csv"
        );
    }
}
