use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ledger::LedgerEntry;
use crate::scanner::Scanner;

/// Scan failures ride back in the body with `status: "failed"`, the envelope
/// the original clients of this API expect; the HTTP status stays 200.
#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    Pipeline(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::InvalidInput(message) => message,
            ApiError::Pipeline(message) => {
                log::error!("Scan pipeline error: {message}");
                message
            }
        };

        Json(json!({
            "error": message,
            "status": "failed"
        }))
        .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    url: String,
    prediction: String,
    confidence: f64,
    risk_score: u8,
    reasons: Vec<String>,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    count: usize,
    results: Vec<LedgerEntry>,
}

pub fn router(scanner: Arc<Scanner>) -> Router {
    // Browser clients (the dashboard, the extension popup) call this API
    // cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/scan-url", post(scan_url))
        .route("/history", get(history))
        .layer(cors)
        .with_state(scanner)
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "phishguard URL scanning API is running" }))
}

async fn scan_url(
    State(scanner): State<Arc<Scanner>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let url = request.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(ApiError::InvalidInput("URL is required".to_string()));
    }

    let report = scanner
        .scan(&url)
        .await
        .map_err(|e| ApiError::Pipeline(e.to_string()))?;

    Ok(Json(ScanResponse {
        url: report.url,
        prediction: report.prediction.to_string(),
        confidence: report.confidence,
        risk_score: report.risk_score,
        reasons: report.reasons,
        status: "success",
    }))
}

async fn history(
    State(scanner): State<Arc<Scanner>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50);
    let results = scanner
        .history(limit)
        .map_err(|e| ApiError::Pipeline(e.to_string()))?;

    Ok(Json(HistoryResponse {
        count: results.len(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::features::SignalExtractor;
    use crate::ledger::ScanLedger;
    use crate::model::LinearModel;

    fn test_scanner() -> Arc<Scanner> {
        let mut config = Config::default();
        config.use_mock_probes = Some(true);
        Arc::new(Scanner::new(
            config.heuristics.clone(),
            SignalExtractor::new(&config).unwrap(),
            Box::new(LinearModel::default()),
            ScanLedger::open_in_memory().unwrap(),
        ))
    }

    #[test]
    fn test_router_builds() {
        let _router = router(test_scanner());
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = ApiError::InvalidInput("URL is required".to_string()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_scan_handler_rejects_missing_url() {
        let result = scan_url(
            State(test_scanner()),
            Json(ScanRequest { url: None }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_scan_then_history_round_trip() {
        let scanner = test_scanner();

        let Json(scan) = scan_url(
            State(scanner.clone()),
            Json(ScanRequest {
                url: Some("http://192.168.1.1/login/secure/verify".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(scan.status, "success");
        assert!(!scan.reasons.is_empty());

        let Json(history) = history(
            State(scanner),
            Query(HistoryParams { limit: None }),
        )
        .await
        .unwrap();
        assert_eq!(history.count, 1);
        assert_eq!(history.results[0].url, "http://192.168.1.1/login/secure/verify");
    }
}
