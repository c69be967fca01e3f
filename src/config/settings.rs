use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::genai::{ClientConfig, DEFAULT_MODEL, DEFAULT_REGION};
use crate::utils::{GenAiError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT_SECS: f64 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    // Provider selection
    pub vertexai: bool,

    // API key mode
    pub api_key: String,
    pub api_base: Option<String>,

    // Service account mode
    pub project_id: Option<String>,
    pub location: String,

    pub text_model: String,

    // Request behaviour
    pub genai_max_retries: u32,
    pub genai_timeout: f64,

    // Logging
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vertexai: false,

            api_key: String::new(),
            api_base: None,

            project_id: None,
            location: DEFAULT_REGION.to_string(),

            text_model: DEFAULT_MODEL.to_string(),

            genai_max_retries: DEFAULT_MAX_RETRIES,
            genai_timeout: DEFAULT_TIMEOUT_SECS,

            log_dir: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment, after loading `.env` if present.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().trim_matches('"').to_string())
                .filter(|v| !v.is_empty())
        };

        settings.vertexai = read("GENAI_VERTEXAI").map(|v| parse_bool(&v)).unwrap_or(false);

        settings.api_key = read("GOOGLE_API_KEY").unwrap_or_default();
        settings.api_base = read("GOOGLE_API_BASE");

        settings.project_id = read("VERTEX_PROJECT_ID");
        if let Some(location) = read("VERTEX_LOCATION") {
            settings.location = location;
        }

        if let Some(model) = read("TEXT_MODEL") {
            settings.text_model = model;
        }

        settings.genai_max_retries = read("GENAI_MAX_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        settings.genai_timeout = read("GENAI_TIMEOUT")
            .and_then(|v| v.parse().ok())
            .filter(|v: &f64| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        settings.log_dir = read("LOG_DIR").map(PathBuf::from);

        settings
    }

    /// Freeze the current values into an immutable client configuration.
    ///
    /// Later changes to these settings do not affect clients built from the
    /// returned value.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = if self.vertexai {
            ClientConfig::service_account(self.project_id.clone().unwrap_or_default())
                .with_region(self.location.clone())
        } else {
            let mut config = ClientConfig::api_key(self.api_key.clone());
            if let Some(ref base) = self.api_base {
                config = config.with_api_base(base.clone());
            }
            config
        };

        let request_timeout = Duration::try_from_secs_f64(self.genai_timeout).map_err(|e| {
            GenAiError::Config(format!("invalid GENAI_TIMEOUT {}: {}", self.genai_timeout, e))
        })?;

        let config = config
            .with_model(self.text_model.clone())
            .with_request_timeout(request_timeout)
            .with_max_retries(self.genai_max_retries);

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
