use crate::settings::config::Settings;
use anyhow::{Context, Result};
use std::fs;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Settings shared by the actor and the front end. Each process holds its
/// own in-memory copy (e.g. a `--voice` override for one session); saving
/// writes it back so future processes start from the same values.
#[derive(Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    inner: Arc<Mutex<Settings>>,
    backup_path: Option<PathBuf>,
}

impl SettingsManager {
    /// Create a new settings manager with default settings location
    pub fn new() -> Result<Self> {
        Self::from_path(Self::default_settings_path()?)
    }

    /// Create a settings manager from a specific path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            write_settings(&path, &Settings::default())
                .with_context(|| format!("Failed to write default settings to {path:?}"))?;
        }

        let (loaded, backup_path) = Self::load_from_file_with_backup(&path)?;

        Ok(Self {
            settings_path: path,
            inner: Arc::new(Mutex::new(loaded)),
            backup_path,
        })
    }

    /// The application directory (~/.gemchat)
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".gemchat"))
    }

    /// Get the default settings path (~/.gemchat/settings.toml)
    fn default_settings_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("settings.toml"))
    }

    /// Load settings from a TOML file with backup on parse failure. Also
    /// returns where the rejected file was moved, if it was.
    fn load_from_file_with_backup(path: &Path) -> Result<(Settings, Option<PathBuf>)> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {path:?}"))?;

        match toml::from_str(&contents) {
            Ok(settings) => Ok((settings, None)),
            Err(e) => {
                let backup_path = path.with_extension("toml.backup");
                warn!(error = %e, ?backup_path, "Settings file is corrupt; restoring defaults");

                fs::rename(path, &backup_path).with_context(|| {
                    format!("Failed to backup corrupted settings to {backup_path:?}")
                })?;

                let default_settings = Settings::default();
                write_settings(path, &default_settings)
                    .with_context(|| format!("Failed to write default settings to {path:?}"))?;

                Ok((default_settings, Some(backup_path)))
            }
        }
    }

    /// Get the in-memory settings
    pub fn settings(&self) -> Settings {
        self.inner.lock().unwrap().clone()
    }

    /// Update in-memory settings with a closure. Note: settings are not saved to disk
    pub fn update_setting<F>(&self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.inner.lock().unwrap();
        updater(guard.deref_mut());
    }

    /// Save provided settings
    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        write_settings(&self.settings_path, &settings)
            .with_context(|| format!("Failed to write settings to {:?}", self.settings_path))?;
        *self.inner.lock().unwrap() = settings;
        Ok(())
    }

    /// Explicitly persist in-memory settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_settings(self.settings())
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Where an unreadable settings file was moved when this manager
    /// replaced it with defaults. Anything it held, API keys included, is
    /// only in that backup now.
    pub fn restored_from_backup(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Directory for synthesized audio files
    pub fn audio_dir(&self) -> Result<PathBuf> {
        match self.settings().audio_dir {
            Some(dir) => Ok(dir),
            None => Ok(Self::home_dir()?.join("audio")),
        }
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {parent:?}"))?;
    }
    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, contents)?;
    Ok(())
}
