pub const DEFAULT_WAREHOUSE_ENDPOINT: &str = "http://localhost:5001/api/upload-to-databricks";
pub const DEFAULT_WAREHOUSE_SCHEMA: &str = "default";
pub const EARLIEST_DOCUMENT_YEAR: i32 = 2020;
