//! HTTP invocation interface.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::aggregate::AnalysisSummary;
use crate::error::AnalysisError;
use crate::pipeline::ReviewAnalyzer;
use crate::store::StoredAnalysis;

pub struct AppState {
    pub analyzer: ReviewAnalyzer,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    pub product_id: Option<String>,
}

/// Error descriptor returned for every failed call.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub result: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = match &self {
            AnalysisError::InvalidInput => StatusCode::BAD_REQUEST,
            AnalysisError::NotFound { .. } => StatusCode::NOT_FOUND,
            AnalysisError::Detector { .. } => StatusCode::BAD_GATEWAY,
            AnalysisError::Persistence { .. } | AnalysisError::Config { .. } => {
                tracing::error!("🔥 {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { result: self.to_string() })).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(analyze_product, get_analysis, health),
    components(schemas(AnalyzeRequest, ErrorResponse, HealthResponse)),
    tags((name = "analysis", description = "Product review sentiment analysis"))
)]
pub struct ApiDoc;

/// Analyze all reviews of a product and store the result
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Aggregated review analysis"),
        (status = 400, description = "product_id missing", body = ErrorResponse),
        (status = 404, description = "Product has no reviews", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn analyze_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisSummary>, AnalysisError> {
    // An unreadable body is the same as a missing product_id
    let product_id = payload
        .ok()
        .and_then(|Json(req)| req.product_id)
        .ok_or(AnalysisError::InvalidInput)?;

    let summary = state.analyzer.analyze(&product_id).await?;
    Ok(Json(summary))
}

/// Fetch the last stored analysis for a product
#[utoipa::path(
    get,
    path = "/analysis/{product_id}",
    params(("product_id" = String, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Stored analysis"),
        (status = 404, description = "Nothing stored yet", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<StoredAnalysis>, (StatusCode, Json<ErrorResponse>)> {
    match state.analyzer.result_store().load_analysis(&product_id).await {
        Ok(Some(stored)) => Ok(Json(stored)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                result: "No analysis stored for this product".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("🔥 Result store error: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    result: "Failed to load analysis".to_string(),
                }),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "analysis"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/analyze", post(analyze_product))
        .route("/analysis/:product_id", get(get_analysis))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{CallPolicy, Classifier, DetectedSentiment, SentimentDetector};
    use crate::ml::LexiconDetector;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::time::Duration;

    struct UnavailableDetector;

    #[async_trait]
    impl SentimentDetector for UnavailableDetector {
        async fn detect_sentiment(&self, _text: &str) -> anyhow::Result<DetectedSentiment> {
            anyhow::bail!("service unavailable")
        }

        async fn detect_key_phrases(&self, _text: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("service unavailable")
        }
    }

    fn state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_reviews(
                "kettle-9",
                ["Great kettle, boils fast.", "The lid feels flimsy and the handle is awful."],
            )
            .unwrap();
        let classifier = Classifier::new(Arc::new(LexiconDetector::new()));
        Arc::new(AppState {
            analyzer: ReviewAnalyzer::new(store.clone(), store, classifier),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_product_id() {
        let response = analyze_product(State(state()), Ok(Json(AnalyzeRequest { product_id: None })))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"result": "Error: product_id is missing."})
        );
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let request = AnalyzeRequest {
            product_id: Some("toaster-1".to_string()),
        };
        let response = analyze_product(State(state()), Ok(Json(request))).await.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, serde_json::json!({"result": "Product not found!"}));
    }

    #[tokio::test]
    async fn test_analyze_then_fetch_stored() {
        let state = state();
        let request = AnalyzeRequest {
            product_id: Some("kettle-9".to_string()),
        };

        let response = analyze_product(State(state.clone()), Ok(Json(request))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["total_reviews"], 2);
        assert_eq!(summary["short_reviews_count"], 2);
        assert_eq!(summary["sentiment_counts"]["POSITIVE"], 1);
        assert_eq!(summary["sentiment_counts"]["NEGATIVE"], 1);

        let stored = get_analysis(State(state), Path("kettle-9".to_string()))
            .await
            .into_response();
        assert_eq!(stored.status(), StatusCode::OK);
        assert_eq!(body_json(stored).await["review_analysis"], summary);
    }

    #[tokio::test]
    async fn test_detector_outage_still_returns_summary() {
        let store = Arc::new(MemoryStore::new());
        store.insert_reviews("kettle-9", ["Boils fast.", "Lid is loose."]).unwrap();
        let classifier = Classifier::new(Arc::new(UnavailableDetector)).with_policy(CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 0,
            retry_base: Duration::from_millis(1),
        });
        let state = Arc::new(AppState {
            analyzer: ReviewAnalyzer::new(store.clone(), store, classifier),
        });
        let request = AnalyzeRequest {
            product_id: Some("kettle-9".to_string()),
        };

        let response = analyze_product(State(state.clone()), Ok(Json(request))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["total_reviews"], 0);
        assert_eq!(summary["skipped_reviews"], 2);
        assert_eq!(
            summary["sentiment_percentages"],
            serde_json::json!({"POSITIVE": 0.0, "NEGATIVE": 0.0, "NEUTRAL": 0.0, "MIXED": 0.0})
        );

        let stored = get_analysis(State(state), Path("kettle-9".to_string()))
            .await
            .into_response();
        assert_eq!(stored.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fetch_without_stored_analysis() {
        let response = get_analysis(State(state()), Path("kettle-9".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
