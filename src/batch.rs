use anyhow::{Context, Result, bail};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    cache::open_cache,
    classify::Classifier,
    cli::ExtractArgs,
    common::{current_year, display_file_name, validate_year},
    document::read_document_text,
    export::{default_export_file_name, write_csv_file},
    extract::CodeExtractor,
    session::{
        DocumentMetadata, InMemorySession, LineOfBusiness, SessionStore, process_document,
    },
    upload::upload_to_warehouse,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub documents: usize,
    pub with_codes: usize,
    pub without_codes: usize,
    pub failed: usize,
    pub codes: usize,
}

/// Metadata shared by every document in one batch; the file name is filled
/// in per document.
#[derive(Debug, Clone)]
pub struct BatchMetadata {
    pub payer: String,
    pub plan: String,
    pub year: i32,
    pub line_of_business: LineOfBusiness,
}

impl BatchMetadata {
    fn for_file(&self, path: &Path) -> DocumentMetadata {
        DocumentMetadata::new(
            display_file_name(path),
            self.payer.clone(),
            self.plan.clone(),
            self.year,
            self.line_of_business,
        )
    }
}

fn apply_document_progress_style(progress: &ProgressBar) {
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:32.magenta/blue}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("=> "));
    }
}

/// Reads and extracts each document in turn. A document that cannot be read
/// is logged and skipped; the rest of the batch still runs.
pub fn process_files(
    extractor: &CodeExtractor,
    session: &mut dyn SessionStore,
    files: &[PathBuf],
    metadata: &BatchMetadata,
) -> BatchSummary {
    let progress = if std::io::stderr().is_terminal() {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    apply_document_progress_style(&progress);

    let mut summary = BatchSummary {
        documents: files.len(),
        ..BatchSummary::default()
    };

    for path in files {
        let file_name = display_file_name(path);
        progress.set_message(file_name.clone());

        let text = match read_document_text(path) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!("Could not read content from {file_name}");
                summary.without_codes += 1;
                progress.inc(1);
                continue;
            }
            Err(err) => {
                tracing::error!("Error processing {file_name}: {err:#}");
                summary.failed += 1;
                progress.inc(1);
                continue;
            }
        };

        let added = process_document(
            extractor,
            session,
            &metadata.for_file(path),
            Some(text.as_str()),
        );
        if added.is_empty() {
            tracing::warn!("No codes extracted from {file_name}");
            summary.without_codes += 1;
        } else {
            tracing::info!(
                "Successfully processed {file_name} - Found {} codes",
                added.len()
            );
            for record in &added {
                tracing::debug!("  {}", record.code);
            }
            summary.with_codes += 1;
            summary.codes += added.len();
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!(
        "{} documents, {} codes",
        summary.documents, summary.codes
    ));
    summary
}

pub async fn run(args: ExtractArgs) -> Result<()> {
    let year = validate_year(args.year.unwrap_or_else(current_year))?;
    let metadata = BatchMetadata {
        payer: args.payer.clone(),
        plan: args.plan.clone(),
        year,
        line_of_business: args.line_of_business,
    };

    let classifier = Arc::new(Classifier::with_cache(open_cache(args.cache_db.as_deref())?));
    let extractor = CodeExtractor::new(classifier);
    let mut session = InMemorySession::default();

    let summary = process_files(&extractor, &mut session, &args.files, &metadata);

    for record in session.records() {
        println!("{}\t{}", record.metadata.file_name, record.code);
    }

    if session.is_empty() {
        println!("No codes extracted; nothing to export.");
    } else {
        let output_csv = args
            .output_csv
            .clone()
            .unwrap_or_else(|| args.output_dir.join(default_export_file_name(&Local::now())));
        write_csv_file(&output_csv, session.records())?;
        println!(
            "Wrote {} rows to {}",
            session.len(),
            output_csv.display()
        );

        if args.upload {
            let client = Client::builder()
                .user_agent("prior-auth-codes/0.1")
                .build()
                .context("Failed creating HTTP client")?;
            upload_to_warehouse(&client, &args.warehouse, session.records()).await?;
            println!("Data successfully uploaded to the warehouse.");
        }
    }

    if summary.failed > 0 {
        bail!(
            "{} of {} documents could not be processed",
            summary.failed,
            summary.documents
        );
    }
    Ok(())
}
