pub mod gemini;
pub mod mock;
pub mod provider;
pub mod types;

pub use gemini::GeminiTts;
pub use mock::MockTts;
pub use provider::TextToSpeech;
pub use types::{AudioClip, Voice};
