//! tiny-trip-rs: validated travel itineraries from an LLM provider
//!
//! A trip request is turned into a prompt, sent to a text-generation
//! provider, and the reply is pulled apart and checked until it is a typed
//! [`Itinerary`] whose days, coordinates and echoed request fields can be
//! trusted. Transient failures and bad model output are retried with
//! backoff; permanent provider errors end the request immediately.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tiny_trip_rs::{BudgetTier, GeminiClient, ItineraryService, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("GEMINI_API_KEY")?;
//!     let service = ItineraryService::new(Arc::new(GeminiClient::new(api_key)));
//!
//!     let request = TripRequest::new("Kyoto", 3, ["food", "history"], BudgetTier::Moderate)?;
//!     let itinerary = service.plan_trip(&request).await?;
//!     println!("{}", itinerary.outline());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod server;
pub mod services;
pub mod types;

pub use config::{PlannerConfig, ProviderKind};
pub use crate::core::{ItineraryService, PlanStage, RetryPolicy};
pub use error::{
    ExtractionError, FailureOutcome, GenerationFailure, ProviderError, ProviderErrorKind, Result,
    StageError, TripError, ValidationError, ValidationErrorKind,
};
pub use schemas::{validate, CompletionSchema, ItineraryPayload, SchemaHandle};
pub use services::{build_prompt, extract_json, GeminiClient, OpenAIClient, TextGenerator};
pub use types::{
    Activity, BudgetTier, DayPlan, Itinerary, TripMood, TripRequest, WeatherCondition, WeatherHint,
};

#[cfg(feature = "cli")]
pub mod cli;
