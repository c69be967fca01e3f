//! Text generation through Google's generative AI API.
//!
//! Two authentication modes are supported: a Gemini API key (optionally routed
//! through an API-compatible proxy) and Vertex AI with ambient service-account
//! credentials. Each generation call is retried with bounded exponential
//! backoff.
//!
//! ```no_run
//! # async fn run() -> genai_text::Result<()> {
//! use genai_text::{ClientConfig, TextGenerationClient};
//!
//! let client = TextGenerationClient::new(ClientConfig::api_key("AIza..."))?;
//! let text = client.generate_text("Summarize the release notes", 0).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Settings;
pub use services::{
    AuthMode, ClientConfig, CredentialProvider, GenerateContentTransport, GenerationRequest,
    InlineImage, RetryPolicy, TextGenerationClient,
};
pub use utils::{GenAiError, Result};
