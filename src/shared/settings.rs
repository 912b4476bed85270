use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::PathBuf;
use std::time::Duration;
use directories::ProjectDirs;

use crate::core::activation::hotkey::HOTKEY_CHOICES;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{HotkeyBinding, LanguagePair};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub hotkey: HotkeyBinding,
    pub translation: TranslationSettings,
    pub preferences: UserPreferences,
    pub activation: ActivationSettings,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/v1/translate".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub source_lang: String,
    pub target_lang: String,
    pub favorite_languages: Vec<String>,
    pub sound_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            source_lang: "ru".to_string(),
            target_lang: "en".to_string(),
            favorite_languages: ["ru", "en", "es", "fr"].iter().map(|s| s.to_string()).collect(),
            sound_enabled: true,
        }
    }
}

/// Rectangle around the hot-corner anchor, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotCornerMargins {
    /// Distance of the anchor below the top edge of the screen.
    pub anchor_inset: f64,
    pub half_width: f64,
    pub below: f64,
    pub above: f64,
}

impl Default for HotCornerMargins {
    fn default() -> Self {
        Self {
            anchor_inset: 10.0,
            half_width: 100.0,
            below: 30.0,
            above: 10.0,
        }
    }
}

/// Timing and geometry of the activation state machine. The settle delays are
/// empirical and platform dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationSettings {
    pub poll_interval_ms: u64,
    pub auto_hide_ms: u64,
    pub selection_settle_ms: u64,
    pub clipboard_settle_ms: u64,
    pub keystroke_gap_ms: u64,
    pub reveal_ms: u64,
    pub conceal_ms: u64,
    pub popup_width: f64,
    pub popup_height: f64,
    pub hot_corner: HotCornerMargins,
}

impl Default for ActivationSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            auto_hide_ms: 5_000,
            selection_settle_ms: 50,
            clipboard_settle_ms: 100,
            keystroke_gap_ms: 10,
            reveal_ms: 250,
            conceal_ms: 300,
            popup_width: 480.0,
            popup_height: 173.0,
            hot_corner: HotCornerMargins::default(),
        }
    }
}

impl ActivationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }

    pub fn selection_settle(&self) -> Duration {
        Duration::from_millis(self.selection_settle_ms)
    }

    pub fn clipboard_settle(&self) -> Duration {
        Duration::from_millis(self.clipboard_settle_ms)
    }

    pub fn keystroke_gap(&self) -> Duration {
        Duration::from_millis(self.keystroke_gap_ms)
    }

    pub fn reveal(&self) -> Duration {
        Duration::from_millis(self.reveal_ms)
    }

    pub fn conceal(&self) -> Duration {
        Duration::from_millis(self.conceal_ms)
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "translation-popup")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::System("Failed to determine config directory".to_string()))
    }

    pub fn languages(&self) -> LanguagePair {
        LanguagePair::new(&self.preferences.source_lang, &self.preferences.target_lang)
    }

    /// Load from the default location; a missing file yields defaults.
    pub async fn load() -> AppResult<Self> {
        Self::load_from(&Self::get_settings_path()?).await
    }

    pub async fn load_from(path: &PathBuf) -> AppResult<Self> {
        if !fs::try_exists(path).await? {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Validation(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the default location, writing defaults out on first run so
    /// there is a file to edit.
    pub async fn load_or_init() -> AppResult<Self> {
        Self::load_or_init_at(&Self::get_settings_path()?).await
    }

    pub async fn load_or_init_at(path: &PathBuf) -> AppResult<Self> {
        if fs::try_exists(path).await? {
            return Self::load_from(path).await;
        }
        let settings = Self::default();
        settings.save_to(path).await?;
        Ok(settings)
    }

    pub async fn save_to(&self, path: &PathBuf) -> AppResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        validate_language(&self.preferences.source_lang)?;
        validate_language(&self.preferences.target_lang)?;
        for code in &self.preferences.favorite_languages {
            validate_language(code)?;
        }

        url::Url::parse(&self.translation.endpoint)
            .map_err(|e| AppError::Validation(format!("Invalid endpoint '{}': {}", self.translation.endpoint, e)))?;

        if self.activation.poll_interval_ms == 0 {
            return Err(AppError::Validation("poll_interval_ms must be positive".to_string()));
        }

        if self.hotkey.key_index >= HOTKEY_CHOICES.len() {
            return Err(AppError::Validation(format!(
                "hotkey key_index {} out of range (0..{})",
                self.hotkey.key_index,
                HOTKEY_CHOICES.len()
            )));
        }

        Ok(())
    }
}

/// Accepts ISO 639-1 codes only; the endpoint speaks two-letter codes.
pub fn validate_language(code: &str) -> AppResult<()> {
    isolang::Language::from_639_1(code)
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Unknown language code '{}'", code)))
}

/// English display name for a language code, if known.
pub fn language_name(code: &str) -> Option<&'static str> {
    isolang::Language::from_639_1(code).map(|lang| lang.to_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("translation-popup-{}-{}", name, std::process::id()));
        path.push("settings.json");
        path
    }

    #[test]
    fn defaults_are_valid() {
        let settings = AppSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.languages(), LanguagePair::new("ru", "en"));
        assert_eq!(settings.activation.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.activation.auto_hide(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_language() {
        let mut settings = AppSettings::default();
        settings.preferences.target_lang = "xx".to_string();
        assert!(matches!(settings.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_out_of_range_hotkey() {
        let mut settings = AppSettings::default();
        settings.hotkey.key_index = HOTKEY_CHOICES.len();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_bad_endpoint() {
        let mut settings = AppSettings::default();
        settings.translation.endpoint = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"hotkey": {"enabled": false, "key_index": 2}}"#).unwrap();
        assert_eq!(settings.hotkey, HotkeyBinding { enabled: false, key_index: 2 });
        assert_eq!(settings.translation, TranslationSettings::default());
        assert_eq!(settings.activation.hot_corner.half_width, 100.0);
    }

    #[test]
    fn language_names() {
        assert_eq!(language_name("en"), Some("English"));
        assert_eq!(language_name("zz"), None);
    }

    #[tokio::test]
    async fn save_and_reload_roundtrip() {
        let path = temp_settings_path("roundtrip");
        let mut settings = AppSettings::default();
        settings.preferences.target_lang = "es".to_string();
        settings.hotkey.enabled = false;

        settings.save_to(&path).await.unwrap();
        let loaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded, settings);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn first_run_writes_defaults() {
        let path = temp_settings_path("first-run");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());

        let settings = AppSettings::load_or_init_at(&path).await.unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(path.exists());

        // An existing file wins over defaults.
        let mut edited = settings.clone();
        edited.preferences.source_lang = "de".to_string();
        edited.save_to(&path).await.unwrap();
        assert_eq!(AppSettings::load_or_init_at(&path).await.unwrap(), edited);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let path = temp_settings_path("missing");
        let loaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded, AppSettings::default());
    }
}
