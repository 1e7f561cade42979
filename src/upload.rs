use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::{cli::WarehouseArgs, common::truncate_for_log, session::CodeRecord};

#[derive(Debug, Serialize)]
struct WarehousePayload<'a> {
    server_url: &'a str,
    token: &'a str,
    schema: &'a str,
    data: &'a [CodeRecord],
}

/// Sends the whole session to the warehouse bridge in one request.
///
/// Only HTTP 200 counts as success. Nothing is retried; the caller decides
/// whether to try again.
pub async fn upload_to_warehouse(
    client: &Client,
    warehouse: &WarehouseArgs,
    records: &[CodeRecord],
) -> Result<()> {
    if records.is_empty() {
        bail!("Warehouse upload requested but there are no extracted codes to send");
    }
    let server_url = warehouse
        .server_url
        .as_deref()
        .context("Warehouse upload requested but --warehouse-server-url was not provided")?;
    let token = warehouse
        .token
        .as_deref()
        .context("Warehouse upload requested but --warehouse-token was not provided")?;

    let payload = WarehousePayload {
        server_url,
        token,
        schema: &warehouse.schema,
        data: records,
    };

    tracing::info!(
        "Uploading {} rows to {} (schema {})",
        records.len(),
        warehouse.endpoint,
        warehouse.schema
    );
    let response = client
        .post(&warehouse.endpoint)
        .json(&payload)
        .send()
        .await
        .with_context(|| format!("Failed connecting to warehouse endpoint {}", warehouse.endpoint))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        bail!(
            "Warehouse upload failed with HTTP {}: {}",
            status.as_u16(),
            truncate_for_log(&body)
        );
    }

    tracing::info!("Warehouse upload complete ({} rows)", records.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::Classifier,
        extract::CodeExtractor,
        session::{DocumentMetadata, InMemorySession, LineOfBusiness, SessionStore, process_document},
    };
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    async fn spawn_bridge(status: AxumStatus, seen: Arc<Mutex<Vec<Value>>>) -> String {
        let app = Router::new().route(
            "/api/upload-to-databricks",
            post(move |Json(body): Json<Value>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().expect("lock").push(body);
                    (status, "bridge says hi")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}/api/upload-to-databricks")
    }

    fn warehouse(endpoint: String) -> WarehouseArgs {
        WarehouseArgs {
            endpoint,
            server_url: Some("https://dbc.example.net".to_string()),
            token: Some("dapi-test".to_string()),
            schema: "prior_auth".to_string(),
        }
    }

    fn records() -> Vec<CodeRecord> {
        let extractor = CodeExtractor::new(Arc::new(Classifier::new()));
        let mut session = InMemorySession::default();
        let metadata =
            DocumentMetadata::new("a.pdf", "Acme", "Gold", 2024, LineOfBusiness::Medicare);
        process_document(&extractor, &mut session, &metadata, Some("99213 G0101"));
        session.records().to_vec()
    }

    #[tokio::test]
    async fn posts_payload_and_accepts_200() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let endpoint = spawn_bridge(AxumStatus::OK, Arc::clone(&seen)).await;

        upload_to_warehouse(&Client::new(), &warehouse(endpoint), &records())
            .await
            .expect("upload");

        let bodies = seen.lock().expect("lock");
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["server_url"], "https://dbc.example.net");
        assert_eq!(body["token"], "dapi-test");
        assert_eq!(body["schema"], "prior_auth");
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["data"][1]["code"], "G0101");
    }

    #[tokio::test]
    async fn non_200_status_is_an_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let endpoint = spawn_bridge(AxumStatus::CREATED, Arc::clone(&seen)).await;

        let err = upload_to_warehouse(&Client::new(), &warehouse(endpoint), &records())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 201"), "{err}");
        assert!(err.to_string().contains("bridge says hi"), "{err}");
    }

    #[tokio::test]
    async fn missing_settings_fail_before_sending() {
        let mut settings = warehouse("http://127.0.0.1:9/unused".to_string());
        settings.token = None;
        let err = upload_to_warehouse(&Client::new(), &settings, &records())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--warehouse-token"));

        let err = upload_to_warehouse(&Client::new(), &warehouse("x".to_string()), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no extracted codes"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = upload_to_warehouse(
            &Client::new(),
            &warehouse(format!("http://{addr}/api/upload-to-databricks")),
            &records(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed connecting"));
    }
}
