pub mod ai;
pub mod audio;
pub mod chat;
pub mod settings;
pub mod voice;

// Public library API - front ends should only need these.
pub use ai::provider::AiProvider;
pub use audio::{encode_wav, WavContainer};
pub use chat::{ChatActor, ChatActorBuilder, ChatActorMessage, ChatEvent, ChatMessage};
pub use settings::{Settings, SettingsManager};
