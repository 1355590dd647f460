use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const DEFAULT_SERP_BASE_URL: &str = "https://serpapi.com";
const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_NEO4J_URI: &str = "http://localhost:7474";

const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 8000;
const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 6;
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(String),
    Invalid { var: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid { var, value } => {
                write!(f, "{} has an invalid value: '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SerpConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentConfig {
    pub timeout: Duration,
    pub concurrency: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_ENRICHMENT_TIMEOUT_MS),
            concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub completion: CompletionConfig,
    /// `None` when `SERP_API_KEY` is not set; place enrichment is skipped.
    pub serp: Option<SerpConfig>,
    pub nominatim: NominatimConfig,
    /// `None` when `NEO4J_PASSWORD` is not set; query logging is skipped.
    pub graph: Option<GraphConfig>,
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let completion = CompletionConfig {
            api_key: get("GROQ_API_KEY").ok_or_else(|| ConfigError::Missing("GROQ_API_KEY".to_string()))?,
            base_url: parse_url(&get, "GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL)?,
            model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            temperature: parse_or(&get, "GROQ_TEMPERATURE", 1.0)?,
            top_p: parse_or(&get, "GROQ_TOP_P", 1.0)?,
            max_tokens: parse_or(&get, "GROQ_MAX_TOKENS", 1024)?,
            timeout: Duration::from_secs(parse_or(
                &get,
                "COMPLETION_TIMEOUT_SECS",
                DEFAULT_COMPLETION_TIMEOUT_SECS,
            )?),
        };

        let serp = match get("SERP_API_KEY") {
            Some(api_key) => Some(SerpConfig {
                api_key,
                base_url: parse_url(&get, "SERP_BASE_URL", DEFAULT_SERP_BASE_URL)?,
            }),
            None => None,
        };

        let nominatim = NominatimConfig {
            base_url: parse_url(&get, "NOMINATIM_BASE_URL", DEFAULT_NOMINATIM_BASE_URL)?,
            user_agent: get("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|| format!("wayfarer-api/{}", env!("CARGO_PKG_VERSION"))),
        };

        let graph = match get("NEO4J_PASSWORD") {
            Some(password) => Some(GraphConfig {
                uri: parse_url(&get, "NEO4J_URI", DEFAULT_NEO4J_URI)?,
                user: get("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string()),
                password,
                database: get("NEO4J_DATABASE").unwrap_or_else(|| "neo4j".to_string()),
            }),
            None => None,
        };

        let enrichment = EnrichmentConfig {
            timeout: Duration::from_millis(parse_or(
                &get,
                "ENRICHMENT_TIMEOUT_MS",
                DEFAULT_ENRICHMENT_TIMEOUT_MS,
            )?),
            concurrency: parse_or(&get, "ENRICHMENT_CONCURRENCY", DEFAULT_ENRICHMENT_CONCURRENCY)?
                .max(1),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| HOST.to_string()),
            port: parse_or(&get, "PORT", PORT)?,
            completion,
            serp,
            nominatim,
            graph,
            enrichment,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_url<G>(get: &G, var: &str, default: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = get(var).unwrap_or_else(|| default.to_string());
    match Url::parse(&value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            Ok(value.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::Invalid {
            var: var.to_string(),
            value,
        }),
    }
}
