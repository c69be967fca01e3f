use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::models::schemas::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};
use crate::services::credentials::CredentialProvider;
use crate::utils::{sanitize_error_message, GenAiError, Result};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_API_VERSION: &str = "v1beta";
const VERTEX_API_VERSION: &str = "v1";

/// The provider boundary: one `generateContent` call, no retries.
#[async_trait]
pub trait GenerateContentTransport: Send + Sync + fmt::Debug {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Gemini API, either Google's host or an API-compatible proxy.
    GeminiApi { base_url: String },
    Vertex { project_id: String, region: String },
}

impl Endpoint {
    pub fn gemini_api(base_url: Option<&str>) -> Self {
        let base_url = base_url.unwrap_or(GEMINI_BASE_URL).trim_end_matches('/').to_string();
        Endpoint::GeminiApi { base_url }
    }

    pub fn vertex(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Endpoint::Vertex {
            project_id: project_id.into(),
            region: region.into(),
        }
    }

    pub fn generate_content_url(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        match self {
            Endpoint::GeminiApi { base_url } => {
                format!("{}/{}/models/{}:generateContent", base_url, GEMINI_API_VERSION, model)
            }
            Endpoint::Vertex { project_id, region } => {
                let host = if region == "global" {
                    "https://aiplatform.googleapis.com".to_string()
                } else {
                    format!("https://{}-aiplatform.googleapis.com", region)
                };
                format!(
                    "{}/{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                    host, VERTEX_API_VERSION, project_id, region, model
                )
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Endpoint,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpTransport {
    pub fn new(
        endpoint: Endpoint,
        credentials: Arc<dyn CredentialProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GenAiError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl GenerateContentTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint.generate_content_url(model);
        debug!("Sending request to GenAI API: {}", url);

        let builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request);
        let builder = self.credentials.authorize(builder).await?;

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => api_error.error.message,
                Err(_) => body,
            };
            let message = sanitize_error_message(&message);
            error!(status = %status, "GenAI API error: {}", message);

            return Err(GenAiError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}
