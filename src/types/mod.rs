pub mod itinerary;
pub mod trip;

pub use itinerary::{Activity, DayPlan, Itinerary, WeatherCondition, WeatherHint};
pub use trip::{BudgetTier, TripMood, TripRequest, KNOWN_INTERESTS, MAX_DURATION_DAYS};
