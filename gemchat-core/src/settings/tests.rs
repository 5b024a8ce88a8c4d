use crate::ai::mock::MockBehavior;
use crate::settings::config::{ProviderConfig, DEFAULT_GREETING};
use crate::settings::manager::SettingsManager;
use crate::settings::Settings;
use tempfile::TempDir;

#[test]
fn test_missing_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    let settings = manager.settings();
    assert_eq!(settings.active_provider.as_deref(), Some("gemini"));
    assert!(matches!(
        settings.active_provider(),
        Some(ProviderConfig::Gemini { .. })
    ));
    assert_eq!(settings.greeting, DEFAULT_GREETING);
    assert_eq!(settings.voice.voice_name, "Zephyr");
    assert_eq!(settings.voice.sample_rate.get(), 16_000);
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "this is [not valid toml").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let backup = temp_dir.path().join("settings.toml.backup");
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "this is [not valid toml"
    );
    assert_eq!(manager.settings().greeting, DEFAULT_GREETING);
    assert_eq!(
        manager.restored_from_backup(),
        Some(temp_dir.path().join("settings.toml.backup").as_path())
    );
}

#[test]
fn test_invalid_field_reports_backup_with_original_key() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let contents = r#"
[providers.gemini]
type = "gemini"
api_key = "keep-me"

[voice]
sample_rate = 0
"#;
    std::fs::write(&settings_path, contents).unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let backup = manager
        .restored_from_backup()
        .expect("invalid file should be moved aside");
    assert!(std::fs::read_to_string(backup).unwrap().contains("keep-me"));

    // A clean file loads without a backup
    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.restored_from_backup(), None);
}

#[test]
fn test_partial_file_uses_field_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &settings_path,
        r#"
active_provider = "work"

[providers.work]
type = "gemini"
api_key = "abc123"

[voice]
voice_name = "Kore"
"#,
    )
    .unwrap();

    let manager = SettingsManager::from_path(settings_path).unwrap();
    let settings = manager.settings();

    let Some(ProviderConfig::Gemini {
        api_key,
        base_url,
        chat_model,
        tts_model,
    }) = settings.active_provider()
    else {
        panic!("expected the gemini provider to be active");
    };
    assert_eq!(api_key, "abc123");
    assert_eq!(base_url, "https://generativelanguage.googleapis.com/v1beta");
    assert_eq!(chat_model, "gemini-2.5-flash-preview-05-20");
    assert_eq!(tts_model, "gemini-2.5-flash-preview-tts");
    assert_eq!(settings.voice.voice_name, "Kore");
    assert_eq!(settings.voice.sample_rate.get(), 16_000);
    assert_eq!(settings.greeting, DEFAULT_GREETING);
}

#[test]
fn test_zero_sample_rate_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "[voice]\nsample_rate = 0\n").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(temp_dir.path().join("settings.toml.backup").exists());
    assert_eq!(manager.settings().voice.sample_rate.get(), 16_000);
}

#[test]
fn test_save_round_trips_through_disk() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let mut settings = Settings::default();
    settings.add_provider(
        "mock".to_string(),
        ProviderConfig::Mock {
            behavior: MockBehavior::Reply {
                text: "hi".to_string(),
            },
        },
    );
    settings.set_active_provider("mock").unwrap();
    settings.greeting = "Welcome back".to_string();
    manager.save_settings(settings).unwrap();

    let reloaded = SettingsManager::from_path(settings_path).unwrap().settings();
    assert_eq!(reloaded.active_provider.as_deref(), Some("mock"));
    assert_eq!(reloaded.greeting, "Welcome back");
    assert!(matches!(
        reloaded.active_provider(),
        Some(ProviderConfig::Mock {
            behavior: MockBehavior::Reply { .. }
        })
    ));
}

#[test]
fn test_update_setting_is_in_memory_only() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    manager.update_setting(|s| s.voice.voice_name = "Puck".to_string());
    assert_eq!(manager.settings().voice.voice_name, "Puck");

    let on_disk = SettingsManager::from_path(settings_path).unwrap().settings();
    assert_eq!(on_disk.voice.voice_name, "Zephyr");
}

#[test]
fn test_set_unknown_provider_fails() {
    let mut settings = Settings::default();
    assert!(settings.set_active_provider("nope").is_err());
    assert_eq!(settings.list_providers(), vec!["gemini".to_string()]);
}

#[test]
fn test_configured_key_wins_over_environment() {
    let config = ProviderConfig::gemini("  from-settings ");
    assert_eq!(config.gemini_api_key().as_deref(), Some("from-settings"));

    let mock = ProviderConfig::Mock {
        behavior: MockBehavior::Success,
    };
    assert_eq!(mock.gemini_api_key(), None);
}
