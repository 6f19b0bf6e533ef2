mod common;

use common::{kyoto_payload, kyoto_request};
use serde_json::Value;
use tiny_trip_rs::{extract_json, validate, ExtractionError};

fn wrappings(object: &str) -> Vec<String> {
    vec![
        object.to_string(),
        format!("```json\n{}\n```", object),
        format!("```\n{}\n```", object),
        format!("Here is your itinerary:\n\n{}\n\nHave a great trip!", object),
        format!(
            "Sure! Below is the plan.\n```json\n{}\n```\nLet me know if you want changes {{or more days}}.",
            object
        ),
        format!("{} // generated", object),
    ]
}

#[test]
fn test_object_survives_prose_and_fences() {
    let compact = kyoto_payload(3).to_string();
    let pretty = serde_json::to_string_pretty(&kyoto_payload(3)).unwrap();

    for object in [compact, pretty] {
        let expected: Value = serde_json::from_str(&object).unwrap();
        for raw in wrappings(&object) {
            let candidate = extract_json(&raw).unwrap();
            let parsed: Value = serde_json::from_str(candidate).unwrap();
            assert_eq!(parsed, expected, "wrapping lost data: {}", raw);
        }
    }
}

#[test]
fn test_extracted_candidate_validates() {
    let raw = format!(
        "```json\n{}\n```",
        serde_json::to_string_pretty(&kyoto_payload(2)).unwrap()
    );
    let candidate = extract_json(&raw).unwrap();
    let itinerary = validate(candidate, &kyoto_request(2)).unwrap();
    assert_eq!(itinerary.days.len(), 2);
}

#[test]
fn test_extraction_failures() {
    assert_eq!(
        extract_json("I'm sorry, I can't plan that trip.").unwrap_err(),
        ExtractionError::NoObject
    );

    let truncated = kyoto_payload(2).to_string();
    let truncated = &truncated[..truncated.len() - 3];
    assert!(matches!(
        extract_json(truncated),
        Err(ExtractionError::Unbalanced { start: 0 })
    ));
}

#[test]
fn test_fenced_payload_with_fence_marker_in_text() {
    let mut payload = kyoto_payload(2);
    payload["itinerary"][0]["summary"] = serde_json::json!("Try ``` {braces} here");

    for object in [
        payload.to_string(),
        serde_json::to_string_pretty(&payload).unwrap(),
    ] {
        let raw = format!("Here you go:\n```json\n{}\n```\nEnjoy!", object);
        let candidate = extract_json(&raw).unwrap();
        assert_eq!(serde_json::from_str::<Value>(candidate).unwrap(), payload);

        let itinerary = validate(candidate, &kyoto_request(2)).unwrap();
        assert_eq!(itinerary.days[0].summary, "Try ``` {braces} here");
    }
}
