//! HTTP request handlers for the server.
//!
//! Implements the email parsing and health check endpoints using axum.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use mailsift_domain::traits::CompletionProvider;
use mailsift_domain::{EmailRequest, ParsedResult};
use mailsift_extractor::{Extractor, ExtractorError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

/// Shared application state
///
/// `extractor` is `None` when startup could not build one; the server then
/// runs in maintenance mode.
pub struct AppState<P: CompletionProvider> {
    /// Extractor shared across requests
    pub extractor: Option<Arc<Extractor<P>>>,
}

impl<P: CompletionProvider> AppState<P> {
    /// State serving requests with `extractor`
    pub fn new(extractor: Extractor<P>) -> Self {
        Self {
            extractor: Some(Arc::new(extractor)),
        }
    }

    /// State with no extractor
    pub fn maintenance() -> Self {
        Self { extractor: None }
    }

    /// Whether parse requests can be served
    pub fn is_ready(&self) -> bool {
        self.extractor.is_some()
    }
}

impl<P: CompletionProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
        }
    }
}

/// Root banner
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// Greeting
    pub message: String,
    /// Documentation path
    pub docs: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub detail: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request body is blank
    EmptyBody,
    /// No extractor available, or it gave up on the request
    Unavailable(String),
    /// Extraction failed for a reason retrying cannot fix
    Extraction(ExtractorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::EmptyBody => (
                StatusCode::BAD_REQUEST,
                "email_body cannot be empty".to_string(),
            ),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Extraction(e) => {
                error!("Extraction failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse { detail: message });
        (status, body).into_response()
    }
}

impl From<ExtractorError> for AppError {
    fn from(e: ExtractorError) -> Self {
        AppError::Extraction(e)
    }
}

/// GET / - Service banner
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Email Parser API is running".to_string(),
        docs: "/docs".to_string(),
    })
}

/// GET /health - Readiness check
async fn health_check<P: CompletionProvider + 'static>(
    State(state): State<AppState<P>>,
) -> Result<Json<HealthCheckResponse>, AppError> {
    if !state.is_ready() {
        return Err(AppError::Unavailable(
            "Service unavailable - LLM not initialized".to_string(),
        ));
    }

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
    }))
}

/// POST /parse-email - Extract customer records from a raw email
async fn parse_email<P: CompletionProvider + 'static>(
    State(state): State<AppState<P>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<ParsedResult>, AppError> {
    if request.email_body.trim().is_empty() {
        warn!("Empty email_body received");
        return Err(AppError::EmptyBody);
    }

    let extractor = state.extractor.as_ref().ok_or_else(|| {
        error!("Extractor unavailable, service in maintenance mode");
        AppError::Unavailable("Service under maintenance".to_string())
    })?;

    match extractor.complete(&request).await? {
        Some(result) => {
            info!("Email parsed: {} records", result.emails.len());
            Ok(Json(result))
        }
        None => {
            error!("No valid reply after all attempts");
            Err(AppError::Unavailable("Service under maintenance".to_string()))
        }
    }
}

/// Create the axum router with all routes
///
/// Requests and responses are traced at `INFO`, so the default filter shows
/// one line per request.
pub fn create_router<P: CompletionProvider + 'static>(state: AppState<P>) -> AxumRouter {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    AxumRouter::new()
        .route("/", get(root))
        .route("/health", get(health_check::<P>))
        .route("/parse-email", post(parse_email::<P>))
        .layer(trace)
        .with_state(state)
}
