use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::open_cache;
use crate::classify::{Classification, Classifier};
use crate::cli::{ServeArgs, WarehouseArgs};
use crate::common::{current_year, validate_year};
use crate::document::text_from_bytes;
use crate::export::{csv_string, default_export_file_name};
use crate::extract::CodeExtractor;
use crate::session::{
    CodeRecord, DocumentMetadata, InMemorySession, LineOfBusiness, SessionStore, process_document,
};
use crate::upload::upload_to_warehouse;

#[derive(Clone)]
struct AppState {
    extractor: CodeExtractor,
    session: Arc<Mutex<InMemorySession>>,
    client: Client,
    warehouse: Arc<WarehouseArgs>,
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let classifier = Classifier::with_cache(open_cache(opts.cache_db.as_deref())?);
    let client = Client::builder()
        .user_agent("prior-auth-codes/0.1")
        .build()
        .context("create HTTP client")?;

    let state = AppState {
        extractor: CodeExtractor::new(Arc::new(classifier)),
        session: Arc::new(Mutex::new(InMemorySession::default())),
        client,
        warehouse: Arc::new(opts.warehouse.clone()),
    };

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/documents", post(api_process_document))
        .route("/api/codes", get(api_list_codes).delete(api_clear_codes))
        .route("/api/codes.csv", get(api_codes_csv))
        .route("/api/classify/:code", get(api_classify))
        .route("/api/upload", post(api_upload))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DocumentParams {
    file_name: String,
    payer: Option<String>,
    plan: Option<String>,
    year: Option<i32>,
    line_of_business: Option<LineOfBusiness>,
}

#[derive(Debug, Serialize)]
struct DocumentResponse {
    file_name: String,
    codes_found: usize,
    codes: Vec<CodeRecord>,
}

async fn api_process_document(
    State(st): State<AppState>,
    Query(p): Query<DocumentParams>,
    body: Bytes,
) -> Response {
    let year = match validate_year(p.year.unwrap_or_else(current_year)) {
        Ok(v) => v,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let text = match document_text(p.file_name.clone(), body).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Error processing {}: {e:#}", p.file_name);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Could not read content from {}: {e:#}", p.file_name),
            )
                .into_response();
        }
    };

    let metadata = DocumentMetadata::new(
        p.file_name.clone(),
        p.payer.unwrap_or_default(),
        p.plan.unwrap_or_default(),
        year,
        p.line_of_business.unwrap_or_default(),
    );

    let codes = {
        let mut session = st.session.lock().await;
        process_document(&st.extractor, &mut *session, &metadata, text.as_deref())
    };
    if codes.is_empty() {
        tracing::warn!("No codes extracted from {}", p.file_name);
    } else {
        tracing::info!(
            "Successfully processed {} - Found {} codes",
            p.file_name,
            codes.len()
        );
    }

    Json(DocumentResponse {
        file_name: p.file_name,
        codes_found: codes.len(),
        codes,
    })
    .into_response()
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn document_text(file_name: String, body: Bytes) -> anyhow::Result<Option<String>> {
    tokio::task::spawn_blocking(move || text_from_bytes(&file_name, &body))
        .await
        .context("Document parsing task failed")?
}

async fn api_list_codes(State(st): State<AppState>) -> Json<Vec<CodeRecord>> {
    let session = st.session.lock().await;
    Json(session.records().to_vec())
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    cleared: usize,
}

async fn api_clear_codes(State(st): State<AppState>) -> Json<ClearResponse> {
    let mut session = st.session.lock().await;
    let cleared = session.len();
    session.clear();
    tracing::info!("Cleared {cleared} extracted codes");
    Json(ClearResponse { cleared })
}

async fn api_codes_csv(State(st): State<AppState>) -> Response {
    let csv = {
        let session = st.session.lock().await;
        csv_string(session.records())
    };
    match csv {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                default_export_file_name(&Local::now())
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn api_classify(
    State(st): State<AppState>,
    AxumPath(code): AxumPath<String>,
) -> Json<Classification> {
    Json(st.extractor.classifier().classify(&code))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    uploaded: usize,
}

async fn api_upload(State(st): State<AppState>) -> Response {
    let records = st.session.lock().await.records().to_vec();
    if records.is_empty() {
        return (StatusCode::BAD_REQUEST, "No extracted codes to upload").into_response();
    }
    match upload_to_warehouse(&st.client, &st.warehouse, &records).await {
        Ok(()) => Json(UploadResponse {
            uploaded: records.len(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!("Error uploading to warehouse: {e:#}");
            (StatusCode::BAD_GATEWAY, format!("{e:#}")).into_response()
        }
    }
}
