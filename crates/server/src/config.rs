//! Application configuration.
//!
//! Every setting has a default; `FACEFIND_*` environment variables override
//! them. The result is split into one explicit config value per collaborator
//! client, so nothing downstream reads the environment.
//!
//! | Variable                         | Default                     |
//! |----------------------------------|-----------------------------|
//! | `FACEFIND_FACE_ENDPOINT`         | `https://api.luxand.cloud`  |
//! | `FACEFIND_FACE_API_KEY`          | none                        |
//! | `FACEFIND_FACE_TIMEOUT_SECS`     | 30                          |
//! | `FACEFIND_SERPAPI_ENDPOINT`      | `https://serpapi.com/search.json` |
//! | `FACEFIND_SERPAPI_KEY`           | none                        |
//! | `FACEFIND_SEARCH_TIMEOUT_SECS`   | 30                          |
//! | `FACEFIND_THRESHOLD`             | 70                          |
//! | `FACEFIND_CONCURRENCY`           | 4                           |
//! | `FACEFIND_PAGE_TIMEOUT_SECS`     | 7                           |
//! | `FACEFIND_RENDER_TIMEOUT_SECS`   | 15                          |
//! | `FACEFIND_RENDER`                | true                        |
//! | `FACEFIND_IMAGE_TIMEOUT_SECS`    | 30                          |

use crate::serpapi::SerpApiConfig;
use face_client::FaceServiceConfig;
use face_client::client::{DEFAULT_FACE_ENDPOINT, DEFAULT_FACE_TIMEOUT};
use pipeline::{DEFAULT_IMAGE_TIMEOUT, PipelineConfig};
use records::{MAX_SIMILARITY, MIN_SIMILARITY};
use resolver::ResolverConfig;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const PREFIX: &str = "FACEFIND_";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("{var} must be set")]
    Missing { var: String },
}

/// Everything the orchestrator and the CLI need to build their clients.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub face_endpoint: String,
    pub face_api_key: Option<String>,
    pub face_timeout: Duration,
    pub serpapi: SerpApiConfig,
    pub serpapi_key: Option<String>,
    pub resolver: ResolverConfig,
    pub pipeline: PipelineConfig,
    pub image_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            face_endpoint: DEFAULT_FACE_ENDPOINT.to_string(),
            face_api_key: None,
            face_timeout: DEFAULT_FACE_TIMEOUT,
            serpapi: SerpApiConfig::default(),
            serpapi_key: None,
            resolver: ResolverConfig::default(),
            pipeline: PipelineConfig::default(),
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `FACEFIND_*` name. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let mut config = Self::default();

        if let Some(endpoint) = vars.string("FACE_ENDPOINT") {
            config.face_endpoint = endpoint;
        }
        config.face_api_key = vars.string("FACE_API_KEY");
        if let Some(timeout) = vars.seconds("FACE_TIMEOUT_SECS")? {
            config.face_timeout = timeout;
        }

        if let Some(endpoint) = vars.string("SERPAPI_ENDPOINT") {
            config.serpapi.endpoint = endpoint;
        }
        config.serpapi_key = vars.string("SERPAPI_KEY");
        if let Some(timeout) = vars.seconds("SEARCH_TIMEOUT_SECS")? {
            config.serpapi.timeout = timeout;
        }

        if let Some(threshold) = vars.parse::<f32>("THRESHOLD")? {
            if !(threshold > MIN_SIMILARITY && threshold <= MAX_SIMILARITY) {
                return Err(vars.invalid("THRESHOLD", threshold, "must be in (0, 100]"));
            }
            config.pipeline.threshold = threshold;
        }
        if let Some(concurrency) = vars.parse::<usize>("CONCURRENCY")? {
            if concurrency == 0 {
                return Err(vars.invalid("CONCURRENCY", concurrency, "must be at least 1"));
            }
            config.pipeline.concurrency = concurrency;
        }

        if let Some(timeout) = vars.seconds("PAGE_TIMEOUT_SECS")? {
            config.resolver.fetch_timeout = timeout;
        }
        if let Some(timeout) = vars.seconds("RENDER_TIMEOUT_SECS")? {
            config.resolver.render_timeout = timeout;
        }
        if let Some(enabled) = vars.flag("RENDER")? {
            config.resolver.render_enabled = enabled;
        }
        if let Some(timeout) = vars.seconds("IMAGE_TIMEOUT_SECS")? {
            config.image_timeout = timeout;
        }

        Ok(config)
    }

    /// Face service settings; the API key is mandatory here.
    pub fn face_service(&self) -> Result<FaceServiceConfig, ConfigError> {
        let api_key = require(&self.face_api_key, "FACE_API_KEY")?;
        Ok(FaceServiceConfig {
            endpoint: self.face_endpoint.clone(),
            api_key,
            timeout: self.face_timeout,
        })
    }

    /// SerpApi settings with the API key filled in.
    pub fn search_provider(&self) -> Result<SerpApiConfig, ConfigError> {
        let api_key = require(&self.serpapi_key, "SERPAPI_KEY")?;
        Ok(SerpApiConfig {
            api_key,
            ..self.serpapi.clone()
        })
    }
}

fn require(value: &Option<String>, name: &str) -> Result<String, ConfigError> {
    value.clone().ok_or_else(|| ConfigError::Missing {
        var: format!("{}{}", PREFIX, name),
    })
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", PREFIX, name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.string(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| self.invalid(name, &raw, e.to_string()))
            })
            .transpose()
    }

    fn seconds(&self, name: &str) -> Result<Option<Duration>, ConfigError> {
        match self.parse::<u64>(name)? {
            Some(0) => Err(self.invalid(name, 0, "must be at least 1 second")),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.string(name) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(self.invalid(name, &raw, "expected true or false")),
        }
    }

    fn invalid(&self, name: &str, value: impl Display, reason: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            var: format!("{}{}", PREFIX, name),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
