//! Wire shape of the provider's itinerary payload.
//!
//! These types describe what the prompt asks the provider to return. Echoed
//! request fields are plain strings; a drifting echo is reported by the
//! cross-check, not as a type error.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use super::{CompletionSchema, SchemaHandle};

const MIN_LATITUDE: f64 = -90.0;
const MIN_LONGITUDE: f64 = -180.0;

/// Structured itinerary returned by the text-generation provider.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "ItineraryPayload")]
pub struct ItineraryPayload {
    /// Destination exactly as requested
    #[schemars(length(min = 1))]
    pub destination: String,
    /// Number of days in the plan, exactly as requested
    pub duration_days: u32,
    /// Interests exactly as requested
    #[serde(default)]
    pub interests: Vec<String>,
    /// Budget tier exactly as requested: budget-friendly, moderate or luxury
    pub budget_tier: String,
    /// Estimated total cost of the trip in USD
    #[schemars(range(min = 0))]
    pub total_budget_estimate: f64,
    /// One entry per day, numbered from 1
    pub itinerary: Vec<DayPayload>,
}

/// Per-day plan with its activities.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayPayload {
    /// 1-based day counter within the itinerary
    #[schemars(range(min = 1))]
    pub day: u32,
    /// Short theme for the day
    #[schemars(length(min = 1))]
    pub title: String,
    /// Brief summary of the day
    #[schemars(length(min = 1))]
    pub summary: String,
    /// Activities in chronological order
    #[schemars(length(min = 1))]
    pub activities: Vec<ActivityPayload>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    /// Name of the place or activity
    #[schemars(length(min = 1))]
    pub name: String,
    /// Detailed description of the activity
    #[schemars(length(min = 1))]
    pub description: String,
    /// Compelling image search query for the activity
    #[schemars(length(min = 1))]
    pub image_query: String,
    /// Latitude in decimal degrees
    #[schemars(range(min = "MIN_LATITUDE", max = 90))]
    pub lat: f64,
    /// Longitude in decimal degrees
    #[schemars(range(min = "MIN_LONGITUDE", max = 180))]
    pub lng: f64,
    /// Optional weather hint: { "temperature": text, "condition": text, "icon": text }
    #[serde(default)]
    pub weather: Option<Value>,
}

impl CompletionSchema for ItineraryPayload {
    fn schema() -> &'static SchemaHandle {
        static HANDLE: OnceLock<SchemaHandle> = OnceLock::new();
        HANDLE.get_or_init(|| {
            let root = schemars::schema_for!(ItineraryPayload);
            SchemaHandle::from_root_schema("itinerary_payload", root)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = ItineraryPayload::schema().schema_json();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        for field in [
            "destination",
            "durationDays",
            "budgetTier",
            "totalBudgetEstimate",
            "itinerary",
        ] {
            assert!(required.contains(&field), "missing {}", field);
        }
        assert!(!required.contains(&"interests"));
    }

    #[test]
    fn test_schema_bounds_coordinates() {
        let schema = ItineraryPayload::schema().schema_json();
        let activity = &schema["definitions"]["ActivityPayload"]["properties"];
        assert_eq!(activity["lat"]["minimum"], -90.0);
        assert_eq!(activity["lat"]["maximum"], 90.0);
        assert_eq!(activity["lng"]["maximum"], 180.0);
    }

    #[test]
    fn test_schema_handle_is_cached() {
        let first = ItineraryPayload::schema() as *const SchemaHandle;
        let second = ItineraryPayload::schema() as *const SchemaHandle;
        assert_eq!(first, second);
        assert_eq!(ItineraryPayload::schema().schema_name(), "itinerary_payload");
    }

    #[test]
    fn test_compiled_validator_is_shared() {
        let handle = ItineraryPayload::schema();
        let first = handle.validator() as *const jsonschema::JSONSchema;
        let second = ItineraryPayload::schema().validator() as *const jsonschema::JSONSchema;
        assert_eq!(first, second);

        assert!(!handle.validator().is_valid(&serde_json::json!({})));
        assert!(!handle.validator().is_valid(&serde_json::json!({
            "destination": "Kyoto",
            "durationDays": 1,
            "budgetTier": "moderate",
            "totalBudgetEstimate": 100,
            "itinerary": [{"day": 1, "title": "t", "summary": "s", "activities": []}]
        })));
    }
}
