use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    constants::{DEFAULT_WAREHOUSE_ENDPOINT, DEFAULT_WAREHOUSE_SCHEMA},
    session::LineOfBusiness,
};

#[derive(Parser, Debug)]
#[command(name = "prior-auth-codes")]
#[command(about = "Extract and classify CPT, HCPCS and PLA codes from prior authorization documents", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract codes from documents, attach metadata, and export them as CSV.
    Extract(ExtractArgs),
    /// Look up the category, subcategory and description of individual codes.
    Classify(ClassifyArgs),
    /// Serve the HTTP API backing the document upload UI.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Documents to process (.pdf, .txt, .text, .md).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Payer the documents belong to.
    #[arg(long, default_value = "")]
    pub payer: String,

    /// Plan name within the payer.
    #[arg(long, default_value = "")]
    pub plan: String,

    /// Policy year (2020 through the current year). Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, value_enum, default_value_t = LineOfBusiness::Medicare)]
    pub line_of_business: LineOfBusiness,

    /// CSV output path. If omitted, a timestamped file is written to --output-dir.
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Directory for the timestamped CSV export.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// SQLite database that persists classification lookups between runs.
    #[arg(long)]
    pub cache_db: Option<PathBuf>,

    /// Forward all extracted rows to the warehouse bridge after exporting.
    #[arg(long, default_value_t = false)]
    pub upload: bool,

    #[command(flatten)]
    pub warehouse: WarehouseArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Codes to look up, e.g. 99213 A0428 0001U.
    #[arg(required = true)]
    pub codes: Vec<String>,

    /// SQLite database that persists classification lookups between runs.
    #[arg(long)]
    pub cache_db: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8788)]
    pub port: u16,

    /// SQLite database that persists classification lookups between runs.
    #[arg(long)]
    pub cache_db: Option<PathBuf>,

    #[command(flatten)]
    pub warehouse: WarehouseArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct WarehouseArgs {
    /// Bridge endpoint that accepts the upload payload.
    #[arg(
        long = "warehouse-endpoint",
        env = "WAREHOUSE_ENDPOINT",
        default_value = DEFAULT_WAREHOUSE_ENDPOINT
    )]
    pub endpoint: String,

    /// Warehouse server URL forwarded in the payload.
    #[arg(long = "warehouse-server-url", env = "WAREHOUSE_SERVER_URL")]
    pub server_url: Option<String>,

    /// Warehouse access token forwarded in the payload.
    #[arg(
        long = "warehouse-token",
        env = "WAREHOUSE_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Target schema forwarded in the payload.
    #[arg(
        long = "warehouse-schema",
        env = "WAREHOUSE_SCHEMA",
        default_value = DEFAULT_WAREHOUSE_SCHEMA
    )]
    pub schema: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extract_with_metadata() {
        let args = Args::try_parse_from([
            "prior-auth-codes",
            "extract",
            "a.pdf",
            "b.txt",
            "--payer",
            "Acme",
            "--year",
            "2023",
            "--line-of-business",
            "marketplace",
            "--upload",
            "--warehouse-schema",
            "claims",
        ])
        .expect("parse");

        let Command::Extract(extract) = args.cmd else {
            panic!("expected extract subcommand");
        };
        assert_eq!(extract.files.len(), 2);
        assert_eq!(extract.payer, "Acme");
        assert_eq!(extract.plan, "");
        assert_eq!(extract.year, Some(2023));
        assert_eq!(extract.line_of_business, LineOfBusiness::Marketplace);
        assert!(extract.upload);
        assert_eq!(extract.warehouse.schema, "claims");
    }

    #[test]
    fn extract_requires_files() {
        assert!(Args::try_parse_from(["prior-auth-codes", "extract"]).is_err());
    }

    #[test]
    fn classify_takes_codes() {
        let args = Args::try_parse_from(["prior-auth-codes", "classify", "99213", "A0428"])
            .expect("parse");
        let Command::Classify(classify) = args.cmd else {
            panic!("expected classify subcommand");
        };
        assert_eq!(classify.codes, vec!["99213", "A0428"]);
        assert!(classify.cache_db.is_none());
    }
}
