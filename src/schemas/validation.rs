use std::collections::HashSet;

use jsonschema::error::ValidationErrorKind as SchemaErrorKind;
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    payload::{ActivityPayload, DayPayload, ItineraryPayload},
    CompletionSchema, SchemaHandle,
};
use crate::{
    error::{ValidationError, ValidationErrorKind},
    types::{
        itinerary::{Activity, DayPlan, Itinerary, WeatherCondition, WeatherHint},
        trip::{BudgetTier, TripRequest},
    },
};

const ROOT_PATH: &str = "<root>";

/// Keys written by older prompt templates, mapped to their current names.
const LEGACY_ROOT_KEYS: [(&str, &str); 2] = [("duration", "durationDays"), ("budget", "budgetTier")];

/// Validate a candidate JSON string against the itinerary shape and the trip request.
///
/// Runs four steps in order and stops at the first failure: parse, structural
/// validation against the payload schema, day-sequence validation and the
/// cross-check of echoed request fields. Only a fully valid payload produces
/// an [`Itinerary`].
pub fn validate(candidate: &str, request: &TripRequest) -> Result<Itinerary, ValidationError> {
    let mut value: Value = serde_json::from_str(candidate).map_err(|err| {
        ValidationError::new(
            ValidationErrorKind::ParseFailure,
            ROOT_PATH,
            format!("candidate is not valid JSON: {}", err),
        )
    })?;

    if !value.is_object() {
        return Err(ValidationError::new(
            ValidationErrorKind::WrongType,
            ROOT_PATH,
            format!("expected a JSON object, found {}", json_type_name(&value)),
        ));
    }
    if let Some(object) = value.as_object_mut() {
        normalize_legacy_keys(object);
    }

    let schema = ItineraryPayload::schema();
    check_against_schema(schema, &value)?;
    let payload = decode_payload(schema, &value)?;
    check_text_fields(&payload)?;

    let days = check_day_sequence(payload.itinerary, request.duration_days())?;
    cross_check(&payload.destination, payload.duration_days, &payload.budget_tier, request)?;

    Ok(Itinerary {
        destination: request.destination().to_string(),
        duration_days: request.duration_days(),
        interests: request.interests().to_vec(),
        budget_tier: request.budget_tier(),
        mood: request.mood(),
        total_budget_estimate: payload.total_budget_estimate,
        days: days.into_iter().map(into_day_plan).collect(),
    })
}

fn normalize_legacy_keys(object: &mut Map<String, Value>) {
    for (legacy, current) in LEGACY_ROOT_KEYS {
        if !object.contains_key(current) {
            if let Some(value) = object.remove(legacy) {
                object.insert(current.to_string(), value);
            }
        }
    }
}

/// Structural gate: the first JSON Schema violation becomes a typed validation error.
fn check_against_schema(schema: &SchemaHandle, payload: &Value) -> Result<(), ValidationError> {
    let result = schema.validator().validate(payload);
    let Err(mut errors) = result else {
        return Ok(());
    };
    let Some(error) = errors.next() else {
        return Ok(());
    };

    let pointer_path = pointer_to_path(&error.instance_path.to_string());
    let location = if pointer_path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        pointer_path.clone()
    };
    let detail = error.to_string();
    let mapped = match &error.kind {
        SchemaErrorKind::Required { property } => {
            let property = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            ValidationError::new(
                ValidationErrorKind::MissingField,
                join_path(&pointer_path, &property),
                format!("required field `{}` is missing", property),
            )
        }
        SchemaErrorKind::Type { .. } => {
            ValidationError::new(ValidationErrorKind::WrongType, location, detail)
        }
        SchemaErrorKind::Minimum { .. }
        | SchemaErrorKind::Maximum { .. }
        | SchemaErrorKind::ExclusiveMinimum { .. }
        | SchemaErrorKind::ExclusiveMaximum { .. } => {
            ValidationError::new(ValidationErrorKind::OutOfRange, location, detail)
        }
        SchemaErrorKind::MinLength { .. } => {
            ValidationError::new(ValidationErrorKind::MissingField, location, detail)
        }
        SchemaErrorKind::MinItems { .. } | SchemaErrorKind::MaxItems { .. } => {
            ValidationError::new(ValidationErrorKind::LengthMismatch, location, detail)
        }
        _ => ValidationError::new(ValidationErrorKind::WrongType, location, detail),
    };

    debug!(
        target: "tinytrip::schema",
        schema = schema.schema_name(),
        error = %mapped,
        payload = %payload
    );
    Err(mapped)
}

/// Typed decode of a payload that already passed the schema gate.
fn decode_payload(schema: &SchemaHandle, payload: &Value) -> Result<ItineraryPayload, ValidationError> {
    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            ROOT_PATH.to_string()
        } else {
            path
        };
        ValidationError::new(
            ValidationErrorKind::WrongType,
            location,
            format!(
                "failed to deserialize `{}`: {}",
                schema.schema_name(),
                err.inner()
            ),
        )
    })
}

/// Whitespace-only text passes `minLength` but is just as absent as an empty string.
fn check_text_fields(payload: &ItineraryPayload) -> Result<(), ValidationError> {
    require_text("destination", &payload.destination)?;

    for (day_idx, day) in payload.itinerary.iter().enumerate() {
        let day_path = format!("itinerary[{}]", day_idx);
        require_text(&format!("{}.title", day_path), &day.title)?;
        require_text(&format!("{}.summary", day_path), &day.summary)?;

        for (activity_idx, activity) in day.activities.iter().enumerate() {
            let activity_path = format!("{}.activities[{}]", day_path, activity_idx);
            require_text(&format!("{}.name", activity_path), &activity.name)?;
            require_text(&format!("{}.description", activity_path), &activity.description)?;
            require_text(&format!("{}.imageQuery", activity_path), &activity.image_query)?;
        }
    }

    Ok(())
}

fn require_text(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            path,
            "text must not be blank",
        ));
    }
    Ok(())
}

/// Day numbers must be exactly `1..=duration_days`; returns the days sorted by number.
fn check_day_sequence(
    mut days: Vec<DayPayload>,
    duration_days: u32,
) -> Result<Vec<DayPayload>, ValidationError> {
    if days.len() != duration_days as usize {
        return Err(ValidationError::new(
            ValidationErrorKind::LengthMismatch,
            "itinerary",
            format!(
                "expected {} day entries, found {}",
                duration_days,
                days.len()
            ),
        ));
    }

    let mut seen = HashSet::with_capacity(days.len());
    for (idx, day) in days.iter().enumerate() {
        let path = format!("itinerary[{}].day", idx);
        if day.day == 0 || day.day > duration_days {
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                path,
                format!("day {} is outside 1..={}", day.day, duration_days),
            ));
        }
        if !seen.insert(day.day) {
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                path,
                format!("duplicate day number {}", day.day),
            ));
        }
        if day.activities.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::LengthMismatch,
                format!("itinerary[{}].activities", idx),
                "every day needs at least one activity",
            ));
        }
    }

    days.sort_by_key(|day| day.day);
    Ok(days)
}

fn cross_check(
    destination: &str,
    duration_days: u32,
    budget_tier: &str,
    request: &TripRequest,
) -> Result<(), ValidationError> {
    if normalize_place(destination) != normalize_place(request.destination()) {
        return Err(ValidationError::new(
            ValidationErrorKind::CrossCheckMismatch,
            "destination",
            format!(
                "provider echoed `{}` but `{}` was requested",
                destination,
                request.destination()
            ),
        ));
    }

    if duration_days != request.duration_days() {
        return Err(ValidationError::new(
            ValidationErrorKind::CrossCheckMismatch,
            "durationDays",
            format!(
                "provider echoed {} days but {} were requested",
                duration_days,
                request.duration_days()
            ),
        ));
    }

    if BudgetTier::parse_lenient(budget_tier) != Some(request.budget_tier()) {
        return Err(ValidationError::new(
            ValidationErrorKind::CrossCheckMismatch,
            "budgetTier",
            format!(
                "provider echoed `{}` but `{}` was requested",
                budget_tier,
                request.budget_tier()
            ),
        ));
    }

    Ok(())
}

fn normalize_place(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn into_day_plan(day: DayPayload) -> DayPlan {
    let day_number = day.day;
    DayPlan {
        day: day.day,
        title: day.title.trim().to_string(),
        summary: day.summary.trim().to_string(),
        activities: day
            .activities
            .into_iter()
            .map(|activity| into_activity(day_number, activity))
            .collect(),
    }
}

fn into_activity(day: u32, activity: ActivityPayload) -> Activity {
    let weather = activity.weather.as_ref().and_then(|raw| {
        let hint = parse_weather(raw);
        if hint.is_none() && !raw.is_null() {
            debug!(
                target: "tinytrip::schema",
                day,
                activity = %activity.name,
                weather = %raw,
                "dropping malformed weather hint"
            );
        }
        hint
    });

    Activity {
        name: activity.name.trim().to_string(),
        description: activity.description.trim().to_string(),
        image_query: activity.image_query.trim().to_string(),
        lat: activity.lat,
        lng: activity.lng,
        weather,
    }
}

/// Best-effort read of the advisory weather hint; anything unusable yields `None`.
fn parse_weather(raw: &Value) -> Option<WeatherHint> {
    let object = raw.as_object()?;

    let temperature = match object.get("temperature").or_else(|| object.get("temp"))? {
        Value::String(text) if !text.trim().is_empty() => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    let condition = WeatherCondition::from_label(object.get("condition")?.as_str()?);
    let icon = object
        .get("icon")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|icon| !icon.is_empty())
        .unwrap_or_else(|| condition.default_icon())
        .to_string();

    Some(WeatherHint {
        temperature,
        condition,
        icon,
    })
}

/// `/itinerary/2/activities/0/lat` -> `itinerary[2].activities[0].lat`
fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').filter(|segment| !segment.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.chars().all(|c| c.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }
    path
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
