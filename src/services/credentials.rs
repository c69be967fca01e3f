//! Credential providers for the two authentication modes.
//!
//! The client never reads credential material itself; it asks a
//! [`CredentialProvider`] to authorize each outgoing request. Service-account
//! mode resolves Application Default Credentials (for example the file named
//! by `GOOGLE_APPLICATION_CREDENTIALS`) once, on first use.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use google_cloud_auth::project::Config as AuthConfig;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use google_cloud_token::{TokenSource, TokenSourceProvider};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::utils::{mask_secret, GenAiError, Result};

const CLOUD_PLATFORM_SCOPES: [&str; 1] = ["https://www.googleapis.com/auth/cloud-platform"];
const API_KEY_HEADER: &str = "x-goog-api-key";

#[async_trait]
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Attach credentials to an outgoing request.
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder>;
}

/// Gemini API key sent in the `x-goog-api-key` header.
#[derive(Clone)]
pub struct ApiKeyCredentials {
    api_key: String,
}

impl ApiKeyCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into() }
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for ApiKeyCredentials {
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.header(API_KEY_HEADER, &self.api_key))
    }
}

/// A bearer token obtained elsewhere.
#[derive(Clone)]
pub struct StaticBearerCredentials {
    token: String,
}

impl StaticBearerCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for StaticBearerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBearerCredentials")
            .field("token", &mask_secret(&self.token))
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticBearerCredentials {
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(&self.token))
    }
}

/// Application Default Credentials through google-cloud-auth.
///
/// The token source is built lazily and shared by every clone; token refresh
/// is handled by the token source itself.
#[derive(Clone, Default)]
pub struct AdcCredentials {
    token_source: Arc<OnceCell<Arc<dyn TokenSource>>>,
}

impl AdcCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    async fn token_source(&self) -> Result<&Arc<dyn TokenSource>> {
        self.token_source
            .get_or_try_init(|| async {
                debug!("Resolving application default credentials");
                let config = AuthConfig::default().with_scopes(&CLOUD_PLATFORM_SCOPES);
                let provider = DefaultTokenSourceProvider::new(config).await.map_err(|e| {
                    error!(error = %e, "Failed to resolve application default credentials");
                    GenAiError::Auth(format!("application default credentials unavailable: {}", e))
                })?;
                Ok::<_, GenAiError>(provider.token_source())
            })
            .await
    }
}

impl fmt::Debug for AdcCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdcCredentials")
            .field("initialized", &self.token_source.initialized())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for AdcCredentials {
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let source = self.token_source().await?;
        // The token source yields a complete header value, e.g. "Bearer ya29...".
        let header_value = source
            .token()
            .await
            .map_err(|e| GenAiError::Auth(format!("failed to fetch access token: {}", e)))?;
        Ok(request.header(AUTHORIZATION, header_value))
    }
}
