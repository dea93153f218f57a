//! `formbar.toml` settings.
//!
//! Every key is optional:
//!
//! ```toml
//! [evaluator]
//! url = "https://forms.example.org/rules/evaluate"
//! timeout_ms = 5000
//! user_agent = "formbar"
//!
//! [dispatch]
//! debounce_ms = 750
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use formbar_core::DEFAULT_DEBOUNCE;
use formbar_remote::DEFAULT_TIMEOUT;

pub const SETTINGS_FILENAME: &str = "formbar.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub evaluator: EvaluatorSettings,
    pub dispatch: DispatchSettings,
}

/// Remote rule evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    /// Absolute endpoint URL; overrides the form's `evalurl`.
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: duration_ms(DEFAULT_TIMEOUT),
            user_agent: None,
        }
    }
}

impl EvaluatorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Quiet period after the last keystroke before a text field dispatches.
    pub debounce_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: duration_ms(DEFAULT_DEBOUNCE),
        }
    }
}

impl DispatchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Load settings from `path`.
///
/// Returns default settings if the file doesn't exist, cannot be read or
/// cannot be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No settings file found at {:?}, using defaults", path);
            Settings::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read settings file: {}, using defaults", e);
            Settings::default()
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.dispatch.debounce(), Duration::from_millis(750));
        assert_eq!(settings.evaluator.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let settings = parse_settings(
            r#"
            [evaluator]
            url = "http://localhost:6543/rules"
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.evaluator.url.as_deref(),
            Some("http://localhost:6543/rules")
        );
        assert_eq!(settings.evaluator.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(settings.dispatch, DispatchSettings::default());
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.dispatch.debounce_ms = 10;
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed = parse_settings(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = load_settings(Path::new("/nonexistent/formbar.toml"));
        assert_eq!(settings, Settings::default());
    }
}
