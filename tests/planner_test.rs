mod common;

use std::sync::Arc;

use common::{fast_service, kyoto_payload, kyoto_request, ScriptedGenerator};
use tiny_trip_rs::{FailureOutcome, ProviderError, StageError, TripError, ValidationErrorKind};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_kyoto_happy_path_single_call() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(format!(
        "```json\n{}\n```",
        kyoto_payload(3)
    ))]));
    let service = fast_service(generator.clone());

    let itinerary = assert_ok!(service.plan_trip(&kyoto_request(3)).await);
    assert_eq!(generator.calls(), 1);
    assert_eq!(itinerary.days.len(), 3);
    assert_eq!(
        itinerary.days.iter().map(|d| d.day).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_three_transient_failures_exhaust_attempts() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Err(ProviderError::transient("HTTP 503 error").with_status(503)),
        Err(ProviderError::transient("connection reset")),
        Err(ProviderError::transient("HTTP 502 error").with_status(502)),
        Ok(kyoto_payload(3).to_string()),
    ]));
    let service = fast_service(generator.clone());

    let failure = assert_err!(service.plan_trip(&kyoto_request(3)).await);
    assert_eq!(failure.attempts, 3);
    assert_eq!(generator.calls(), 3);
    assert_eq!(failure.outcome(), FailureOutcome::Unavailable);
    match &failure.last_error {
        StageError::Provider(err) => assert_eq!(err.status, Some(502)),
        other => panic!("unexpected last error: {other:?}"),
    }
}

#[tokio::test]
async fn test_permanent_failure_stops_immediately() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Err(ProviderError::permanent("HTTP 401 error: invalid key").with_status(401)),
        Ok(kyoto_payload(3).to_string()),
    ]));
    let service = fast_service(generator.clone());

    let failure = service.plan_trip(&kyoto_request(3)).await.unwrap_err();
    assert_eq!(failure.attempts, 1);
    assert_eq!(generator.calls(), 1);
    assert_eq!(failure.outcome(), FailureOutcome::Rejected);

    let err = TripError::from(failure);
    assert_eq!(err.error_code(), "GENERATION_REJECTED");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_recovers_after_bad_output() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("I'd love to help you plan a trip to Kyoto!".to_string()),
        Ok(kyoto_payload(2).to_string()),
        Ok(kyoto_payload(3).to_string()),
    ]));
    let service = fast_service(generator.clone());

    let itinerary = service.plan_trip(&kyoto_request(3)).await.unwrap();
    assert_eq!(generator.calls(), 3);
    assert_eq!(itinerary.days.len(), 3);
}

#[tokio::test]
async fn test_invalid_output_on_every_attempt() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok(kyoto_payload(2).to_string()),
        Ok(kyoto_payload(2).to_string()),
        Ok(kyoto_payload(2).to_string()),
    ]));
    let service = fast_service(generator.clone());

    let failure = service.plan_trip(&kyoto_request(3)).await.unwrap_err();
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.outcome(), FailureOutcome::Unavailable);
    match &failure.last_error {
        StageError::Validation(err) => assert_eq!(err.kind, ValidationErrorKind::LengthMismatch),
        other => panic!("unexpected last error: {other:?}"),
    }

    let payload = TripError::from(failure).to_error_payload();
    assert_eq!(payload["error"]["code"], "GENERATION_UNAVAILABLE");
    assert_eq!(payload["error"]["stage"], "validating");
    assert_eq!(payload["error"]["attempts"], 3);
}

#[tokio::test]
async fn test_permanent_after_transient() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Err(ProviderError::transient("timed out")),
        Err(ProviderError::permanent("Prompt blocked by provider: SAFETY")),
    ]));
    let service = fast_service(generator.clone());

    let failure = service.plan_trip(&kyoto_request(1)).await.unwrap_err();
    assert_eq!(failure.attempts, 2);
    assert_eq!(generator.calls(), 2);
    assert_eq!(failure.outcome(), FailureOutcome::Rejected);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_service() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok(kyoto_payload(2).to_string()),
        Ok(kyoto_payload(2).to_string()),
    ]));
    let service = Arc::new(fast_service(generator.clone()));

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.plan_trip(&kyoto_request(2)).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.plan_trip(&kyoto_request(2)).await }
    });

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
    assert_eq!(generator.calls(), 2);
}
