use serde_json::Value;

use crate::types::trip::TripRequest;

/// Render the generation prompt for a trip request.
///
/// Pure function of its input: no clock, no randomness, so the same request
/// always yields byte-identical text. The request is trusted to already
/// satisfy the `TripRequest` invariants.
pub fn build_prompt(request: &TripRequest) -> String {
    let days = request.duration_days();
    let destination = request.destination();
    let budget = request.budget_tier().as_str();

    let interests_line = if request.interests().is_empty() {
        "no particular interests".to_string()
    } else {
        request.interests().join(", ")
    };

    let mood_line = request
        .mood()
        .map(|mood| format!("- Trip mood: {}\n", mood.as_str()))
        .unwrap_or_default();

    format!(
        "You are an expert travel planner. Create a detailed and engaging {days}-day travel itinerary for a trip to {destination}.\n\
         \n\
         Trip constraints:\n\
         - Destination: {destination}\n\
         - Duration: {days} days\n\
         - Interests: {interests_line}\n\
         - Budget tier: {budget}\n\
         {mood_line}\
         \n\
         Provide a total budget estimate in USD that fits the budget tier.\n\
         For each day, include a title and a brief summary.\n\
         For each activity, include a name, a detailed description, a compelling image search query, \
         and plausible latitude and longitude for the place.\n\
         \n\
         Output rules:\n\
         - Respond with a single minified JSON object and nothing else: no prose, no markdown, no code fences.\n\
         - Echo \"destination\", \"durationDays\" and \"budgetTier\" exactly as given above.\n\
         - \"itinerary\" must contain exactly {days} entries whose \"day\" values are 1 to {days}, each with at least one activity.\n\
         - \"lat\" must be between -90 and 90 and \"lng\" between -180 and 180.\n\
         - \"weather\" is optional; when present use {{\"temperature\": string, \"condition\": one of sunny|clear|cloudy|rainy|thunderstorm|snowy|windy, \"icon\": string}}.\n\
         \n\
         Required JSON shape:\n\
         {shape}",
        shape = output_shape(request),
    )
}

/// Literal description of the payload the provider must return.
fn output_shape(request: &TripRequest) -> String {
    let destination = Value::String(request.destination().to_string());
    let interests = Value::from(request.interests().to_vec());

    format!(
        "{{\n  \
           \"destination\": {destination},\n  \
           \"durationDays\": {days},\n  \
           \"interests\": {interests},\n  \
           \"budgetTier\": \"{budget}\",\n  \
           \"totalBudgetEstimate\": <number, USD, >= 0>,\n  \
           \"itinerary\": [\n    \
             {{\n      \
               \"day\": <integer, 1-based>,\n      \
               \"title\": \"<day title>\",\n      \
               \"summary\": \"<day summary>\",\n      \
               \"activities\": [\n        \
                 {{\n          \
                   \"name\": \"<activity name>\",\n          \
                   \"description\": \"<activity description>\",\n          \
                   \"imageQuery\": \"<compelling image search query>\",\n          \
                   \"lat\": <number>,\n          \
                   \"lng\": <number>,\n          \
                   \"weather\": {{ \"temperature\": \"25°C\", \"condition\": \"sunny\", \"icon\": \"faSun\" }}\n        \
                 }}\n      \
               ]\n    \
             }}\n  \
           ]\n\
         }}",
        destination = destination,
        days = request.duration_days(),
        interests = interests,
        budget = request.budget_tier().as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::{BudgetTier, TripMood};

    fn kyoto() -> TripRequest {
        TripRequest::new("Kyoto", 3, ["food", "history"], BudgetTier::Moderate).unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt(&kyoto()), build_prompt(&kyoto()));
    }

    #[test]
    fn test_prompt_lists_constraints() {
        let prompt = build_prompt(&kyoto());
        assert!(prompt.contains("3-day travel itinerary for a trip to Kyoto"));
        assert!(prompt.contains("- Interests: food, history"));
        assert!(prompt.contains("- Budget tier: moderate"));
        assert!(prompt.contains("single minified JSON object"));
        assert!(!prompt.contains("Trip mood"));
    }

    #[test]
    fn test_prompt_describes_shape() {
        let prompt = build_prompt(&kyoto());
        for field in [
            "\"destination\": \"Kyoto\"",
            "\"durationDays\": 3",
            "\"interests\": [\"food\",\"history\"]",
            "\"budgetTier\": \"moderate\"",
            "\"totalBudgetEstimate\"",
            "\"itinerary\"",
            "\"imageQuery\"",
            "\"lat\"",
            "\"lng\"",
        ] {
            assert!(prompt.contains(field), "prompt is missing {}", field);
        }
    }

    #[test]
    fn test_prompt_without_interests_with_mood() {
        let request = TripRequest::new("Oslo", 1, Vec::<String>::new(), BudgetTier::Luxury)
            .unwrap()
            .with_mood(TripMood::Wellness);
        let prompt = build_prompt(&request);
        assert!(prompt.contains("- Interests: no particular interests"));
        assert!(prompt.contains("- Trip mood: wellness"));
        assert!(prompt.contains("\"interests\": []"));
    }

    #[test]
    fn test_destination_is_escaped_in_shape() {
        let request =
            TripRequest::new("Quote \"Town\"", 2, ["art"], BudgetTier::BudgetFriendly).unwrap();
        let prompt = build_prompt(&request);
        assert!(prompt.contains("\"destination\": \"Quote \\\"Town\\\"\""));
    }
}
