use std::{collections::HashMap, net::SocketAddr};

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{PlannerConfig, ProviderKind},
    core::planner::ItineraryService,
    schemas::{payload::ItineraryPayload, CompletionSchema},
    server,
    types::trip::{BudgetTier, TripMood, TripRequest, KNOWN_INTERESTS},
};

fn command() -> Command {
    Command::new("tiny-trip")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate validated travel itineraries with an LLM provider")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("provider")
                .long("provider")
                .value_name("NAME")
                .global(true)
                .help("Generation provider: openrouter or gemini (or set TRIP_PROVIDER)"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .global(true)
                .help("Model to use (or set TRIP_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .global(true)
                .help("Provider API key (or set OPENAI_API_KEY / GEMINI_API_KEY)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .global(true)
                .help("Provider base URL (or set OPENAI_BASE_URL / GEMINI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .help("Per-call provider timeout in seconds (or set TRIP_TIMEOUT_SECS)"),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .value_name("COUNT")
                .global(true)
                .help("Generation attempts per request (or set TRIP_MAX_ATTEMPTS)"),
        )
        .arg(
            Arg::new("json-mode")
                .long("json-mode")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Ask OpenAI-compatible providers for JSON output mode (or set TRIP_JSON_MODE)"),
        )
        .subcommand(
            Command::new("serve").about("Run the HTTP API").arg(
                Arg::new("bind")
                    .short('b')
                    .long("bind")
                    .value_name("ADDR")
                    .help("Listen address (or set TRIP_BIND / PORT)"),
            ),
        )
        .subcommand(
            Command::new("plan")
                .about("Generate one itinerary and print it as JSON")
                .arg(
                    Arg::new("destination")
                        .short('d')
                        .long("destination")
                        .value_name("PLACE")
                        .required(true),
                )
                .arg(
                    Arg::new("days")
                        .short('n')
                        .long("days")
                        .value_name("COUNT")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("interest")
                        .short('i')
                        .long("interest")
                        .value_name("TAG")
                        .action(ArgAction::Append)
                        .help(format!("Interest tag, repeatable ({})", KNOWN_INTERESTS.join(", "))),
                )
                .arg(
                    Arg::new("budget")
                        .long("budget")
                        .value_name("TIER")
                        .default_value("moderate")
                        .help("budget-friendly, moderate or luxury"),
                )
                .arg(
                    Arg::new("mood")
                        .long("mood")
                        .value_name("MOOD")
                        .help("adventure, relax, wellness or nightlife"),
                )
                .arg(
                    Arg::new("outline")
                        .long("outline")
                        .action(ArgAction::SetTrue)
                        .help("Print a readable outline instead of JSON"),
                ),
        )
        .subcommand(Command::new("schema").about("Print the JSON Schema the provider must satisfy"))
}

/// CLI entry point for the tiny-trip tool
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();

    match matches.subcommand() {
        Some(("serve", sub)) => {
            let mut config = load_config(sub).context("failed to load configuration")?;
            if let Some(bind) = sub.get_one::<String>("bind") {
                let addr = bind
                    .parse::<SocketAddr>()
                    .with_context(|| format!("invalid --bind address '{}'", bind))?;
                config = config.with_bind(addr);
            }
            server::serve(&config).await?;
        }
        Some(("plan", sub)) => {
            let config = load_config(sub).context("failed to load configuration")?;
            let request = plan_request(sub)?;
            let service = ItineraryService::from_config(&config);

            info!(
                "Planning {} days in {} with {} ({})",
                request.duration_days(),
                request.destination(),
                config.provider(),
                config.model()
            );

            match service.plan_trip(&request).await {
                Ok(itinerary) => {
                    if sub.get_flag("outline") {
                        println!("{}", itinerary.outline());
                    } else {
                        println!("{}", serde_json::to_string_pretty(&itinerary)?);
                    }
                }
                Err(failure) => {
                    error!("Itinerary generation failed: {}", failure);
                    eprintln!("{}", failure.user_message());
                    return Err(failure.into());
                }
            }
        }
        Some(("schema", _)) => {
            println!(
                "{}",
                serde_json::to_string_pretty(ItineraryPayload::schema().schema_json())?
            );
        }
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}

/// Environment config with command-line flags layered on top.
fn load_config(matches: &ArgMatches) -> crate::Result<PlannerConfig> {
    let flag = |name: &str| matches.get_one::<String>(name).cloned();

    let provider = match flag("provider").or_else(|| std::env::var("TRIP_PROVIDER").ok()) {
        Some(name) => name.parse()?,
        None if std::env::var("GEMINI_API_KEY").is_ok() => ProviderKind::Gemini,
        None => ProviderKind::OpenRouter,
    };

    let mut overrides: HashMap<&str, String> = HashMap::new();
    overrides.insert("TRIP_PROVIDER", provider.as_str().to_string());
    if let Some(key) = flag("api-key") {
        let var = match provider {
            ProviderKind::OpenRouter => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        };
        overrides.insert(var, key);
    }
    if let Some(base_url) = flag("base-url") {
        overrides.insert("OPENAI_BASE_URL", base_url.clone());
        overrides.insert("GEMINI_BASE_URL", base_url);
    }
    if matches.get_flag("json-mode") {
        overrides.insert("TRIP_JSON_MODE", "true".to_string());
    }
    for (arg, var) in [
        ("model", "TRIP_MODEL"),
        ("timeout", "TRIP_TIMEOUT_SECS"),
        ("max-attempts", "TRIP_MAX_ATTEMPTS"),
    ] {
        if let Some(value) = flag(arg) {
            overrides.insert(var, value);
        }
    }

    PlannerConfig::from_lookup(|key| {
        overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    })
}

fn plan_request(matches: &ArgMatches) -> crate::Result<TripRequest> {
    let destination = matches
        .get_one::<String>("destination")
        .cloned()
        .unwrap_or_default();
    let days = matches.get_one::<u32>("days").copied().unwrap_or_default();
    let interests: Vec<String> = matches
        .get_many::<String>("interest")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let budget = matches
        .get_one::<String>("budget")
        .map(|value| value.parse::<BudgetTier>())
        .transpose()?
        .unwrap_or(BudgetTier::Moderate);

    let request = TripRequest::new(destination, days, interests, budget)?;
    match matches.get_one::<String>("mood") {
        Some(mood) => Ok(request.with_mood(mood.parse::<TripMood>()?)),
        None => Ok(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_plan_arguments() {
        let matches = command().get_matches_from([
            "tiny-trip",
            "plan",
            "--destination",
            "Kyoto",
            "--days",
            "3",
            "-i",
            "food",
            "-i",
            "History",
            "--budget",
            "luxury",
            "--mood",
            "relax",
        ]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "plan");

        let request = plan_request(sub).unwrap();
        assert_eq!(request.destination(), "Kyoto");
        assert_eq!(request.duration_days(), 3);
        assert_eq!(request.interests(), ["food", "history"]);
        assert_eq!(request.budget_tier(), BudgetTier::Luxury);
        assert_eq!(request.mood(), Some(TripMood::Relax));
    }

    #[test]
    fn test_json_mode_flag_after_subcommand() {
        let matches = command().get_matches_from([
            "tiny-trip",
            "plan",
            "--destination",
            "Kyoto",
            "--days",
            "2",
            "--json-mode",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_flag("json-mode"));
    }

    #[test]
    fn test_plan_rejects_zero_days() {
        let matches =
            command().get_matches_from(["tiny-trip", "plan", "--destination", "Kyoto", "--days", "0"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(plan_request(sub).is_err());
    }
}
