use std::env;

/// Application configuration loaded from environment variables.
///
/// API keys only; per-run knobs (query counts, thresholds, output paths)
/// arrive through the CLI so two runs can differ without touching the env.
#[derive(Debug, Clone)]
pub struct Config {
    /// SerpAPI key (maps, place details, local pack, yelp).
    pub serpapi_key: String,

    /// OpenAI key for query/location generation.
    pub openai_api_key: String,
    pub openai_model: String,

    /// Perplexity key for web research. Optional: without it the research
    /// stages are skipped and the run proceeds on search data alone.
    pub perplexity_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            serpapi_key: required_env("SERPAPI_KEY"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            perplexity_api_key: env::var("PERPLEXITY_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }

    /// Log which keys are present without leaking their values.
    pub fn log_redacted(&self) {
        tracing::info!(
            serpapi = !self.serpapi_key.is_empty(),
            openai = !self.openai_api_key.is_empty(),
            perplexity = self.perplexity_api_key.is_some(),
            model = %self.openai_model,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
