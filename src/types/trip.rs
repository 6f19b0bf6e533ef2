use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TripError};

/// Longest trip a single request may ask for.
pub const MAX_DURATION_DAYS: u32 = 60;

/// Interest tags offered by the planning form.
pub const KNOWN_INTERESTS: [&str; 8] = [
    "history",
    "art",
    "food",
    "nature",
    "adventure",
    "relaxation",
    "shopping",
    "nightlife",
];

/// Spending level the itinerary should be planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetTier {
    BudgetFriendly,
    Moderate,
    Luxury,
}

impl BudgetTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::BudgetFriendly => "budget-friendly",
            BudgetTier::Moderate => "moderate",
            BudgetTier::Luxury => "luxury",
        }
    }

    /// Lenient parse used for provider echoes: case, spaces and underscores are ignored.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "budget-friendly" | "budget" | "low" => Some(BudgetTier::BudgetFriendly),
            "moderate" | "medium" | "mid-range" => Some(BudgetTier::Moderate),
            "luxury" | "high" => Some(BudgetTier::Luxury),
            _ => None,
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetTier {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_lenient(s).ok_or_else(|| {
            TripError::InvalidRequest(format!(
                "unknown budget tier `{}` (expected budget-friendly, moderate or luxury)",
                s
            ))
        })
    }
}

/// Overall feel of the trip, as picked on the planning form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripMood {
    Adventure,
    Relax,
    Wellness,
    Nightlife,
}

impl TripMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripMood::Adventure => "adventure",
            TripMood::Relax => "relax",
            TripMood::Wellness => "wellness",
            TripMood::Nightlife => "nightlife",
        }
    }
}

impl fmt::Display for TripMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripMood {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adventure" => Ok(TripMood::Adventure),
            "relax" | "relaxed" => Ok(TripMood::Relax),
            "wellness" => Ok(TripMood::Wellness),
            "nightlife" => Ok(TripMood::Nightlife),
            other => Err(TripError::InvalidRequest(format!(
                "unknown trip mood `{}` (expected adventure, relax, wellness or nightlife)",
                other
            ))),
        }
    }
}

/// User-supplied planning input.
///
/// Built once per generation request through [`TripRequest::new`], which
/// enforces the invariants; the fields cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    destination: String,
    duration_days: u32,
    interests: Vec<String>,
    budget_tier: BudgetTier,
    mood: Option<TripMood>,
}

impl TripRequest {
    pub fn new<I, S>(
        destination: impl Into<String>,
        duration_days: u32,
        interests: I,
        budget_tier: BudgetTier,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(TripError::InvalidRequest(
                "destination must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_DURATION_DAYS).contains(&duration_days) {
            return Err(TripError::InvalidRequest(format!(
                "durationDays must be between 1 and {}, got {}",
                MAX_DURATION_DAYS, duration_days
            )));
        }

        let mut normalized: Vec<String> = Vec::new();
        for interest in interests {
            let tag = interest.as_ref().trim().to_lowercase();
            if !tag.is_empty() && !normalized.contains(&tag) {
                normalized.push(tag);
            }
        }

        Ok(Self {
            destination,
            duration_days,
            interests: normalized,
            budget_tier,
            mood: None,
        })
    }

    /// Derive the trip length from an inclusive date range, the way the planning form does.
    pub fn from_date_range<I, S>(
        destination: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        interests: I,
        budget_tier: BudgetTier,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let duration_days = inclusive_day_count(start, end)?;
        Self::new(destination, duration_days, interests, budget_tier)
    }

    pub fn with_mood(mut self, mood: TripMood) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn budget_tier(&self) -> BudgetTier {
        self.budget_tier
    }

    pub fn mood(&self) -> Option<TripMood> {
        self.mood
    }
}

/// Number of calendar days covered by `start..=end`.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> Result<u32> {
    let span = (end - start).num_days();
    if span < 0 {
        return Err(TripError::InvalidRequest(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }

    u32::try_from(span + 1).map_err(|_| {
        TripError::InvalidRequest(format!("date range {}..{} is too long", start, end))
    })
}
