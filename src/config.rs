use std::{fmt, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use crate::{
    core::{planner::ItineraryService, retry::RetryPolicy},
    error::{Result, TripError},
    services::{
        gemini_client::{self, GeminiClient},
        openai_client::{self, OpenAIClient},
        provider::{TextGenerator, DEFAULT_TIMEOUT},
    },
};

pub const DEFAULT_PORT: u16 = 5001;

/// Which text-generation backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Gemini => "gemini",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = TripError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openrouter" | "openai" => Ok(ProviderKind::OpenRouter),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(TripError::Config(format!(
                "unknown provider '{}', expected openrouter or gemini",
                other
            ))),
        }
    }
}

/// Everything needed to build an [`ItineraryService`] and the HTTP listener.
#[derive(Clone)]
pub struct PlannerConfig {
    provider: ProviderKind,
    api_key: String,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Duration,
    json_mode: bool,
    max_attempts: usize,
    initial_backoff: Duration,
    bind: SocketAddr,
}

impl fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("json_mode", &self.json_mode)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff", &self.initial_backoff)
            .field("bind", &self.bind)
            .finish()
    }
}

impl PlannerConfig {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        let retry = RetryPolicy::default();
        Self {
            provider,
            api_key: api_key.into(),
            base_url: None,
            model: None,
            timeout: DEFAULT_TIMEOUT,
            json_mode: false,
            max_attempts: retry.max_attempts(),
            initial_backoff: retry.initial_backoff(),
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let provider = match get("TRIP_PROVIDER") {
            Some(value) => value.parse()?,
            None if get("GEMINI_API_KEY").is_some() => ProviderKind::Gemini,
            None => ProviderKind::OpenRouter,
        };

        let api_key = get(provider.api_key_var()).ok_or_else(|| {
            TripError::Config(format!(
                "{} environment variable must be set to use the {} provider",
                provider.api_key_var(),
                provider
            ))
        })?;

        let mut config = Self::new(provider, api_key);

        config.base_url = match provider {
            ProviderKind::OpenRouter => {
                get("OPENAI_BASE_URL").or_else(|| get("OPENROUTER_BASE_URL"))
            }
            ProviderKind::Gemini => get("GEMINI_BASE_URL"),
        };
        config.model = get("TRIP_MODEL");

        if let Some(secs) = get("TRIP_TIMEOUT_SECS") {
            let secs: u64 = parse_number("TRIP_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(TripError::Config(
                    "TRIP_TIMEOUT_SECS must be at least 1".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = get("TRIP_JSON_MODE") {
            config.json_mode = parse_flag("TRIP_JSON_MODE", &flag)?;
        }
        if let Some(attempts) = get("TRIP_MAX_ATTEMPTS") {
            config.max_attempts = parse_number("TRIP_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(millis) = get("TRIP_BACKOFF_MS") {
            config.initial_backoff = Duration::from_millis(parse_number("TRIP_BACKOFF_MS", &millis)?);
        }

        if let Some(bind) = get("TRIP_BIND") {
            config.bind = bind
                .parse()
                .map_err(|err| TripError::Config(format!("TRIP_BIND '{}': {}", bind, err)))?;
        } else if let Some(port) = get("PORT") {
            config.bind.set_port(parse_number("PORT", &port)?);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request `response_format: json_object` from OpenAI-compatible providers.
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, ProviderKind::OpenRouter) => openai_client::DEFAULT_MODEL,
            (None, ProviderKind::Gemini) => gemini_client::DEFAULT_MODEL,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn bind(&self) -> SocketAddr {
        self.bind
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.initial_backoff)
    }

    pub fn build_generator(&self) -> Arc<dyn TextGenerator> {
        match self.provider {
            ProviderKind::OpenRouter => {
                let mut client = OpenAIClient::new(self.api_key.clone())
                    .with_model(self.model())
                    .with_timeout(self.timeout)
                    .with_json_mode(self.json_mode);
                if let Some(base_url) = &self.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                Arc::new(client)
            }
            ProviderKind::Gemini => {
                let mut client = GeminiClient::new(self.api_key.clone())
                    .with_model(self.model())
                    .with_timeout(self.timeout);
                if let Some(base_url) = &self.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                Arc::new(client)
            }
        }
    }
}

impl ItineraryService {
    pub fn from_config(config: &PlannerConfig) -> Self {
        // Slack over the HTTP timeout so the client reports its own timeout first.
        let attempt_timeout = config.timeout().saturating_add(Duration::from_secs(5));
        ItineraryService::new(config.build_generator())
            .with_retry_policy(config.retry_policy())
            .with_attempt_timeout(attempt_timeout)
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|err| TripError::Config(format!("{} '{}': {}", key, value, err)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TripError::Config(format!(
            "{} '{}': expected true or false",
            key, value
        ))),
    }
}
