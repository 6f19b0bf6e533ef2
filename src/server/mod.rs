//! HTTP surface for the itinerary service.
//!
//! Routes:
//! - `GET /` liveness text
//! - `GET /health`
//! - `POST /api/generate-itinerary`
//! - `GET /api/itinerary-schema`

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::PlannerConfig,
    core::planner::ItineraryService,
    error::{FailureOutcome, Result, TripError},
    schemas::{payload::ItineraryPayload, CompletionSchema},
    types::{
        itinerary::Itinerary,
        trip::{inclusive_day_count, BudgetTier, TripMood, TripRequest},
    },
};

pub const BANNER: &str = "AI Travel Planner Backend is running!";

/// Build the router around a shared service.
pub fn router(service: Arc<ItineraryService>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/generate-itinerary", post(generate_itinerary))
        .route("/api/itinerary-schema", get(itinerary_schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: &PlannerConfig) -> Result<()> {
    let service = Arc::new(ItineraryService::from_config(config));
    let listener = tokio::net::TcpListener::bind(config.bind()).await?;

    info!(
        target: "tinytrip::server",
        addr = %listener.local_addr()?,
        provider = %config.provider(),
        model = config.model(),
        "listening"
    );

    axum::serve(listener, router(service)).await?;
    Ok(())
}

/// JSON body accepted by `POST /api/generate-itinerary`.
///
/// Accepts the planning form's field names (`duration`, `budget`) as well
/// as the canonical ones. When no duration is given it is derived from the
/// inclusive date range.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequestBody {
    #[serde(default)]
    pub destination: String,
    #[serde(alias = "duration")]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(alias = "budget")]
    pub budget_tier: Option<String>,
    pub mood: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripRequestBody {
    pub fn into_trip_request(self) -> Result<TripRequest> {
        let duration_days = match (self.duration_days, self.start_date, self.end_date) {
            (Some(days), _, _) => days,
            (None, Some(start), Some(end)) => inclusive_day_count(start, end)?,
            _ => {
                return Err(TripError::InvalidRequest(
                    "durationDays (or startDate and endDate) is required".to_string(),
                ))
            }
        };

        let budget_tier = match self.budget_tier.as_deref() {
            Some(tier) => tier.parse::<BudgetTier>()?,
            None => BudgetTier::Moderate,
        };

        let request = TripRequest::new(self.destination, duration_days, self.interests, budget_tier)?;

        match self.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(mood) => Ok(request.with_mood(mood.parse::<TripMood>()?)),
            None => Ok(request),
        }
    }
}

/// Error wrapper carrying the HTTP status mapping.
#[derive(Debug)]
pub struct ApiError(pub TripError);

impl From<TripError> for ApiError {
    fn from(err: TripError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(TripError::InvalidRequest(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TripError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TripError::Generation(failure) => match failure.outcome() {
                FailureOutcome::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                FailureOutcome::Rejected => StatusCode::BAD_GATEWAY,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.to_error_payload())).into_response()
    }
}

async fn banner() -> &'static str {
    BANNER
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn itinerary_schema() -> Json<Value> {
    Json(ItineraryPayload::schema().schema_json().clone())
}

async fn generate_itinerary(
    State(service): State<Arc<ItineraryService>>,
    body: std::result::Result<Json<TripRequestBody>, JsonRejection>,
) -> std::result::Result<Json<Itinerary>, ApiError> {
    let Json(body) = body?;
    let request = body.into_trip_request()?;

    info!(
        target: "tinytrip::server",
        destination = request.destination(),
        days = request.duration_days(),
        budget = %request.budget_tier(),
        "generate itinerary"
    );

    match service.plan_trip(&request).await {
        Ok(itinerary) => Ok(Json(itinerary)),
        Err(failure) => {
            warn!(
                target: "tinytrip::server",
                attempts = failure.attempts,
                outcome = ?failure.outcome(),
                error = %failure.last_error,
                "generation failed"
            );
            Err(TripError::from(failure).into())
        }
    }
}
