pub mod credentials;
pub mod genai;
pub mod image;
pub mod retry;
pub mod transport;

pub use credentials::{
    AdcCredentials, ApiKeyCredentials, CredentialProvider, StaticBearerCredentials,
};
pub use genai::{AuthMode, ClientConfig, GenerationRequest, TextGenerationClient};
pub use image::InlineImage;
pub use retry::RetryPolicy;
pub use transport::{Endpoint, GenerateContentTransport, HttpTransport};
