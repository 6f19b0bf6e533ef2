use std::{fmt, sync::Arc, time::Duration, time::Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use crate::{
    error::{GenerationFailure, ProviderError, StageError},
    schemas::validation::validate,
    services::{extractor::extract_json, prompt::build_prompt, provider::TextGenerator},
    types::{itinerary::Itinerary, trip::TripRequest},
};

/// Where a `plan_trip` call currently is. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    Building,
    Generating,
    Extracting,
    Validating,
    Retrying,
    Done,
}

impl PlanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStage::Building => "building",
            PlanStage::Generating => "generating",
            PlanStage::Extracting => "extracting",
            PlanStage::Validating => "validating",
            PlanStage::Retrying => "retrying",
            PlanStage::Done => "done",
        }
    }
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the prompt → generate → extract → validate pipeline with retries.
///
/// Holds only the generator and immutable settings; one service can serve
/// any number of concurrent `plan_trip` calls.
#[derive(Debug, Clone)]
pub struct ItineraryService {
    generator: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
    attempt_timeout: Option<Duration>,
}

impl ItineraryService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            retry: RetryPolicy::default(),
            attempt_timeout: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upper bound on a single provider call, on top of the client's own HTTP timeout.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = Some(attempt_timeout);
        self
    }

    /// Produce a validated itinerary for `request`.
    ///
    /// Transient provider errors and bad model output are retried up to the
    /// policy's attempt budget. A permanent provider error ends the call at
    /// once. No partial itinerary is ever returned.
    pub async fn plan_trip(&self, request: &TripRequest) -> Result<Itinerary, GenerationFailure> {
        let started = Instant::now();
        let prompt = build_prompt(request);
        debug!(
            target: "tinytrip::planner",
            stage = %PlanStage::Building,
            destination = request.destination(),
            days = request.duration_days(),
            prompt_chars = prompt.len(),
            "prompt built"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;

            let last_error = match self.attempt(&prompt, request, attempt).await {
                Ok(itinerary) => {
                    info!(
                        target: "tinytrip::planner",
                        stage = %PlanStage::Done,
                        attempt,
                        provider = self.generator.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "itinerary generated"
                    );
                    return Ok(itinerary);
                }
                Err(err) => err,
            };

            warn!(
                target: "tinytrip::planner",
                attempt,
                stage = last_error.stage(),
                retryable = last_error.is_retryable(),
                error = %last_error,
                "attempt failed"
            );

            let delay = if last_error.is_retryable() {
                self.retry.delay_after(attempt)
            } else {
                None
            };

            match delay {
                Some(delay) => {
                    debug!(
                        target: "tinytrip::planner",
                        stage = %PlanStage::Retrying,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "backing off"
                    );
                    sleep(delay).await;
                }
                None => {
                    warn!(
                        target: "tinytrip::planner",
                        attempts = attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "itinerary generation failed"
                    );
                    return Err(GenerationFailure {
                        attempts: attempt,
                        last_error,
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        prompt: &str,
        request: &TripRequest,
        attempt: usize,
    ) -> Result<Itinerary, StageError> {
        debug!(target: "tinytrip::planner", stage = %PlanStage::Generating, attempt, "calling provider");
        let raw = self.generate(prompt).await?;
        debug!(target: "tinytrip::planner", attempt, raw = %raw, "raw completion");

        debug!(target: "tinytrip::planner", stage = %PlanStage::Extracting, attempt);
        let candidate = extract_json(&raw)?;

        debug!(target: "tinytrip::planner", stage = %PlanStage::Validating, attempt);
        let itinerary = validate(candidate, request)?;
        Ok(itinerary)
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        match self.attempt_timeout {
            Some(limit) => timeout(limit, self.generator.generate(prompt))
                .await
                .map_err(|_| {
                    ProviderError::transient(format!(
                        "{} call timed out after {} ms",
                        self.generator.name(),
                        limit.as_millis()
                    ))
                })?,
            None => self.generator.generate(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::BudgetTier;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PlanStage::Validating.to_string(), "validating");
        assert_eq!(PlanStage::Retrying.as_str(), "retrying");
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_transient() {
        let service = ItineraryService::new(Arc::new(SlowGenerator))
            .with_retry_policy(RetryPolicy::new(2, Duration::ZERO))
            .with_attempt_timeout(Duration::from_millis(10));
        let request = TripRequest::new("Kyoto", 1, ["food"], BudgetTier::Moderate).unwrap();

        let failure = service.plan_trip(&request).await.unwrap_err();
        assert_eq!(failure.attempts, 2);
        match failure.last_error {
            StageError::Provider(err) => {
                assert!(err.is_transient());
                assert!(err.message.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
