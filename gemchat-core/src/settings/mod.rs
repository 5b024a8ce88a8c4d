pub mod config;
pub mod manager;

#[cfg(test)]
mod tests;

pub use config::{ProviderConfig, Settings, VoiceSettings};
pub use manager::SettingsManager;
