pub mod schemas;

pub use schemas::{GenerateContentRequest, GenerateContentResponse, Part};
