pub mod error_handling;
pub mod logging;

pub use error_handling::{mask_secret, sanitize_error_message, GenAiError, Result};
pub use logging::init_logging;
