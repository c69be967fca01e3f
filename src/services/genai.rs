//! Text generation against the Gemini API or Vertex AI.
//!
//! A [`TextGenerationClient`] is built once from an immutable [`ClientConfig`]
//! and reused. Every generation call runs under its own [`RetryPolicy`]
//! sequence; the client keeps no other state between calls.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::models::schemas::{GenerateContentRequest, GenerateContentResponse, Part};
use crate::services::credentials::{AdcCredentials, ApiKeyCredentials, CredentialProvider};
use crate::services::image::InlineImage;
use crate::services::retry::RetryPolicy;
use crate::services::transport::{Endpoint, GenerateContentTransport, HttpTransport};
use crate::utils::{mask_secret, GenAiError, Result};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// Gemini API key, optionally routed through a compatible proxy.
    ApiKey,
    /// Vertex AI with ambient service-account credentials.
    ServiceAccount,
}

#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub project_id: Option<String>,
    pub region: String,
    pub model_name: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: Some(api_key.into()),
            ..Self::base()
        }
    }

    pub fn service_account(project_id: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ServiceAccount,
            project_id: Some(project_id.into()),
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: None,
            api_base: None,
            project_id: None,
            region: DEFAULT_REGION.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: crate::config::settings::DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Check that the fields required by `mode` are present.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            AuthMode::ServiceAccount => {
                if is_blank(self.project_id.as_deref()) {
                    return Err(GenAiError::Config(
                        "project_id is required in service account mode".to_string(),
                    ));
                }
                if is_blank(Some(self.region.as_str())) {
                    return Err(GenAiError::Config(
                        "region must not be empty in service account mode".to_string(),
                    ));
                }
            }
            AuthMode::ApiKey => {
                if is_blank(self.api_key.as_deref()) {
                    return Err(GenAiError::Config(
                        "api_key is required in API key mode".to_string(),
                    ));
                }
                if let Some(ref base) = self.api_base {
                    Url::parse(base).map_err(|e| {
                        GenAiError::Config(format!("api_base {:?} is not a valid URL: {}", base, e))
                    })?;
                }
            }
        }

        if self.model_name.trim().is_empty() {
            return Err(GenAiError::Config("model_name must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(GenAiError::Config("request_timeout must be positive".to_string()));
        }

        Ok(())
    }

    fn endpoint(&self) -> Endpoint {
        match self.mode {
            AuthMode::ApiKey => Endpoint::gemini_api(self.api_base.as_deref()),
            AuthMode::ServiceAccount => Endpoint::vertex(
                self.project_id.clone().unwrap_or_default(),
                self.region.clone(),
            ),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("mode", &self.mode)
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("api_base", &self.api_base)
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("model_name", &self.model_name)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// One generation call: a prompt, an optional image placed before it, and a
/// thinking budget (0 disables thinking).
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub thinking_budget: u32,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            thinking_budget: 0,
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_thinking_budget(mut self, thinking_budget: u32) -> Self {
        self.thinking_budget = thinking_budget;
        self
    }

    fn to_wire(&self) -> Result<GenerateContentRequest> {
        if self.prompt.trim().is_empty() {
            return Err(GenAiError::InvalidRequest("prompt must not be empty".to_string()));
        }

        let mut parts = Vec::with_capacity(2);
        if let Some(ref image) = self.image {
            parts.push(image.to_part());
        }
        parts.push(Part::text(self.prompt.clone()));

        Ok(GenerateContentRequest::user_turn(parts, self.thinking_budget))
    }
}

#[derive(Debug, Clone)]
pub struct TextGenerationClient {
    config: ClientConfig,
    transport: Arc<dyn GenerateContentTransport>,
    retry_policy: RetryPolicy,
}

impl TextGenerationClient {
    /// Build a client whose credentials come from `config` (API key) or from
    /// the ambient environment (service account).
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let credentials: Arc<dyn CredentialProvider> = match config.mode {
            AuthMode::ApiKey => Arc::new(ApiKeyCredentials::new(
                config.api_key.clone().unwrap_or_default(),
            )),
            AuthMode::ServiceAccount => Arc::new(AdcCredentials::new()),
        };

        Self::with_credentials(config, credentials)
    }

    /// Build a client that authorizes requests through `credentials`.
    pub fn with_credentials(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.endpoint(), credentials, config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a client on top of an arbitrary provider transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn GenerateContentTransport>,
    ) -> Result<Self> {
        config.validate()?;

        match config.mode {
            AuthMode::ServiceAccount => {
                if config.api_key.is_some() || config.api_base.is_some() {
                    warn!("api_key and api_base are ignored in service account mode");
                }
                info!(
                    project = config.project_id.as_deref().unwrap_or_default(),
                    location = %config.region,
                    model = %config.model_name,
                    "Initializing GenAI text client in Vertex AI mode"
                );
            }
            AuthMode::ApiKey => {
                info!(
                    api_base = config.api_base.as_deref().unwrap_or("default"),
                    model = %config.model_name,
                    "Initializing GenAI text client in API key mode"
                );
            }
        }

        let retry_policy = RetryPolicy::from_max_retries(config.max_retries);

        Ok(Self {
            config,
            transport,
            retry_policy,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub async fn generate_text(&self, prompt: &str, thinking_budget: u32) -> Result<String> {
        let request = GenerationRequest::text(prompt).with_thinking_budget(thinking_budget);
        self.generate(&request).await
    }

    /// Generate from an image followed by a prompt.
    ///
    /// An undecodable image fails with [`GenAiError::ImageLoad`] before any
    /// request is sent.
    pub async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        thinking_budget: u32,
    ) -> Result<String> {
        let image = InlineImage::decode(image)?;
        let request = GenerationRequest::text(prompt)
            .with_image(image)
            .with_thinking_budget(thinking_budget);
        self.generate(&request).await
    }

    pub async fn generate_with_image_file(
        &self,
        prompt: &str,
        image_path: &Path,
        thinking_budget: u32,
    ) -> Result<String> {
        let image = InlineImage::from_path(image_path).await?;
        let request = GenerationRequest::text(prompt)
            .with_image(image)
            .with_thinking_budget(thinking_budget);
        self.generate(&request).await
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let wire = request.to_wire()?;
        let operation = if request.image.is_some() {
            "generate_with_image"
        } else {
            "generate_text"
        };

        let wire = &wire;
        self.retry_policy
            .run(operation, GenAiError::is_retryable, move |_attempt| async move {
                let response = self
                    .transport
                    .generate_content(&self.config.model_name, wire)
                    .await?;
                extract_text(response)
            })
            .await
    }
}

/// Pull the answer text out of a response, treating a missing text payload as
/// a (retryable) empty response after logging what the provider reported.
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(text) = response.text() {
        return Ok(text);
    }

    if let Some(candidate) = response.candidates.first() {
        if let Some(ref reason) = candidate.finish_reason {
            warn!("Response text is None, finish_reason: {}", reason);
        }
        if let Some(ref ratings) = candidate.safety_ratings {
            warn!("Safety ratings: {:?}", ratings);
        }
    }
    if let Some(reason) = response.block_reason() {
        warn!("Prompt blocked, block_reason: {}", reason);
    }

    Err(GenAiError::EmptyResponse {
        finish_reason: response.finish_reason().map(str::to_string),
        block_reason: response.block_reason().map(str::to_string),
    })
}
