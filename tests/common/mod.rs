#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tiny_trip_rs::{
    BudgetTier, ItineraryService, ProviderError, RetryPolicy, TextGenerator, TripRequest,
};

/// Generator that replays a fixed script of responses and counts calls.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::permanent("script exhausted")))
    }
}

/// Service with a zero-delay retry schedule so tests do not sleep.
pub fn fast_service(generator: std::sync::Arc<ScriptedGenerator>) -> ItineraryService {
    ItineraryService::new(generator).with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
}

pub fn kyoto_request(days: u32) -> TripRequest {
    TripRequest::new("Kyoto", days, ["food", "history"], BudgetTier::Moderate).unwrap()
}

pub fn kyoto_activity(name: &str, lat: f64, lng: f64) -> Value {
    json!({
        "name": name,
        "description": format!("Spend the morning exploring {}.", name),
        "imageQuery": format!("{} Kyoto", name),
        "lat": lat,
        "lng": lng,
        "weather": { "temperature": "22°C", "condition": "Sunny", "icon": "faSun" }
    })
}

/// A valid provider payload for a Kyoto trip of `days` days.
pub fn kyoto_payload(days: u32) -> Value {
    let places = [
        ("Fushimi Inari Taisha", 34.9671, 135.7727),
        ("Nishiki Market", 35.0050, 135.7649),
        ("Kinkaku-ji", 35.0394, 135.7292),
        ("Arashiyama Bamboo Grove", 35.0170, 135.6713),
    ];

    let itinerary: Vec<Value> = (1..=days)
        .map(|day| {
            let (name, lat, lng) = places[(day as usize - 1) % places.len()];
            json!({
                "day": day,
                "title": format!("Day {} in Kyoto", day),
                "summary": "Shrines, street food and old streets.",
                "activities": [kyoto_activity(name, lat, lng)]
            })
        })
        .collect();

    json!({
        "destination": "Kyoto",
        "durationDays": days,
        "interests": ["food", "history"],
        "budgetTier": "moderate",
        "totalBudgetEstimate": 450 * days,
        "itinerary": itinerary
    })
}
