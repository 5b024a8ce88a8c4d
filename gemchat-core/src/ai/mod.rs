pub mod error;
pub mod gemini;
pub mod mock;
pub mod provider;
pub mod types;

pub use error::AiError;
pub use gemini::{GeminiConfig, GeminiProvider};
pub use provider::AiProvider;
pub use types::*;
