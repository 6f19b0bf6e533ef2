use serde::{Deserialize, Serialize};

use super::trip::{BudgetTier, TripMood};

/// Validated trip plan handed back to callers.
///
/// Only ever built by the validator, so every instance satisfies the
/// itinerary invariants: `days.len() == duration_days`, day numbers are
/// exactly `1..=duration_days` in order, every day has at least one activity
/// and every coordinate lies within geographic bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub destination: String,
    pub duration_days: u32,
    pub interests: Vec<String>,
    pub budget_tier: BudgetTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<TripMood>,
    /// Estimated total spend in USD
    pub total_budget_estimate: f64,
    pub days: Vec<DayPlan>,
}

/// One day of the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based day counter
    pub day: u32,
    pub title: String,
    pub summary: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub description: String,
    /// Search hint for an external image lookup
    pub image_query: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherHint>,
}

/// Advisory weather hint attached to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherHint {
    pub temperature: String,
    pub condition: WeatherCondition,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Clear,
    Cloudy,
    Rainy,
    Thunderstorm,
    Snowy,
    Windy,
    #[serde(other)]
    Unknown,
}

impl WeatherCondition {
    /// Map a free-form condition label ("Partly cloudy", "Light rain") onto the vocabulary.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.contains("thunder") || label.contains("storm") {
            WeatherCondition::Thunderstorm
        } else if label.contains("snow") || label.contains("sleet") {
            WeatherCondition::Snowy
        } else if label.contains("rain") || label.contains("shower") || label.contains("drizzle")
        {
            WeatherCondition::Rainy
        } else if label.contains("cloud") || label.contains("overcast") {
            WeatherCondition::Cloudy
        } else if label.contains("wind") {
            WeatherCondition::Windy
        } else if label.contains("sun") {
            WeatherCondition::Sunny
        } else if label.contains("clear") {
            WeatherCondition::Clear
        } else {
            WeatherCondition::Unknown
        }
    }

    /// Icon name the web client renders for this condition.
    pub fn default_icon(&self) -> &'static str {
        match self {
            WeatherCondition::Sunny | WeatherCondition::Clear | WeatherCondition::Unknown => {
                "faSun"
            }
            WeatherCondition::Cloudy => "faCloud",
            WeatherCondition::Rainy => "faCloudRain",
            WeatherCondition::Thunderstorm => "faBolt",
            WeatherCondition::Snowy => "faSnowflake",
            WeatherCondition::Windy => "faWind",
        }
    }
}

impl Itinerary {
    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|day| day.activities.len()).sum()
    }

    /// Generate a human-readable outline of the plan
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "=== {} ({} day{}) ===",
            self.destination,
            self.duration_days,
            if self.duration_days == 1 { "" } else { "s" }
        ));
        lines.push(format!("Budget tier: {}", self.budget_tier));
        if !self.interests.is_empty() {
            lines.push(format!("Interests: {}", self.interests.join(", ")));
        }
        if let Some(mood) = self.mood {
            lines.push(format!("Mood: {}", mood));
        }
        lines.push(format!(
            "Estimated total: {:.2} USD",
            self.total_budget_estimate
        ));

        for day in &self.days {
            lines.push(String::new());
            lines.push(format!("Day {} - {}", day.day, day.title));
            lines.push(format!("  {}", day.summary));
            for activity in &day.activities {
                let weather = activity
                    .weather
                    .as_ref()
                    .map(|w| format!(" [{}, {:?}]", w.temperature, w.condition))
                    .unwrap_or_default();
                lines.push(format!(
                    "  • {} ({:.4}, {:.4}){}",
                    activity.name, activity.lat, activity.lng, weather
                ));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Itinerary {
        Itinerary {
            destination: "Kyoto".to_string(),
            duration_days: 1,
            interests: vec!["food".to_string()],
            budget_tier: BudgetTier::Moderate,
            mood: None,
            total_budget_estimate: 420.0,
            days: vec![DayPlan {
                day: 1,
                title: "Temples".to_string(),
                summary: "Eastern Higashiyama".to_string(),
                activities: vec![Activity {
                    name: "Kiyomizu-dera".to_string(),
                    description: "Wooden stage over the hillside".to_string(),
                    image_query: "Kiyomizu-dera autumn".to_string(),
                    lat: 34.9949,
                    lng: 135.785,
                    weather: Some(WeatherHint {
                        temperature: "18°C".to_string(),
                        condition: WeatherCondition::Sunny,
                        icon: "faSun".to_string(),
                    }),
                }],
            }],
        }
    }

    #[test]
    fn test_condition_labels() {
        assert_eq!(WeatherCondition::from_label("Sunny"), WeatherCondition::Sunny);
        assert_eq!(
            WeatherCondition::from_label("Partly cloudy"),
            WeatherCondition::Cloudy
        );
        assert_eq!(
            WeatherCondition::from_label("light rain showers"),
            WeatherCondition::Rainy
        );
        assert_eq!(
            WeatherCondition::from_label("Thunderstorms likely"),
            WeatherCondition::Thunderstorm
        );
        assert_eq!(WeatherCondition::from_label("Hazy"), WeatherCondition::Unknown);
        assert_eq!(WeatherCondition::Rainy.default_icon(), "faCloudRain");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["durationDays"], 1);
        assert_eq!(value["budgetTier"], "moderate");
        assert_eq!(value["totalBudgetEstimate"], 420.0);
        assert_eq!(value["days"][0]["activities"][0]["imageQuery"], "Kiyomizu-dera autumn");
        assert_eq!(value["days"][0]["activities"][0]["weather"]["condition"], "sunny");
        assert!(value.get("mood").is_none());
    }

    #[test]
    fn test_outline() {
        let itinerary = sample();
        let outline = itinerary.outline();
        assert!(outline.contains("Kyoto (1 day)"));
        assert!(outline.contains("Day 1 - Temples"));
        assert!(outline.contains("Kiyomizu-dera"));
        assert_eq!(itinerary.activity_count(), 1);
    }
}
