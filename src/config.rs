use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options handed to the recognizer on every (re)start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerSettings {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u16,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
            continuous: true,
            interim_results: true,
            max_alternatives: 5,
        }
    }
}

/// Tunables of the read-along engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for a buffered token to count as the expected word.
    pub match_threshold: f64,
    /// Minimum phonetically-reduced similarity that short-circuits the
    /// plain edit-distance comparison.
    pub phonetic_threshold: f64,
    /// Tokens kept in the buffer after each pass.
    pub buffer_capacity: usize,
    /// Final results without a match before encouraging the reader.
    pub no_match_streak_threshold: u32,
    pub error_restart_delay_ms: u64,
    pub end_restart_delay_ms: u64,
    /// Release the recognizer as soon as the page is read.
    pub stop_on_page_complete: bool,
    /// Confidence given to alternatives that arrive without one.
    pub default_confidence: f32,
    pub recognizer: RecognizerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            phonetic_threshold: 0.9,
            buffer_capacity: 15,
            no_match_streak_threshold: 3,
            error_restart_delay_ms: 1000,
            end_restart_delay_ms: 100,
            stop_on_page_complete: true,
            default_confidence: 0.5,
            recognizer: RecognizerSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("phonetic_threshold", self.phonetic_threshold),
            ("default_confidence", f64::from(self.default_confidence)),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.buffer_capacity == 0 {
            return Err(EngineError::Config("buffer_capacity must be positive".into()));
        }
        if self.no_match_streak_threshold == 0 {
            return Err(EngineError::Config(
                "no_match_streak_threshold must be positive".into(),
            ));
        }
        if self.recognizer.max_alternatives == 0 {
            return Err(EngineError::Config(
                "recognizer.max_alternatives must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn error_restart_delay(&self) -> Duration {
        Duration::from_millis(self.error_restart_delay_ms)
    }

    pub fn end_restart_delay(&self) -> Duration {
        Duration::from_millis(self.end_restart_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.match_threshold, 0.8);
        assert_eq!(config.phonetic_threshold, 0.9);
        assert_eq!(config.buffer_capacity, 15);
        assert_eq!(config.no_match_streak_threshold, 3);
        assert_eq!(config.error_restart_delay(), Duration::from_millis(1000));
        assert_eq!(config.end_restart_delay(), Duration::from_millis(100));
        assert_eq!(config.recognizer.max_alternatives, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"buffer_capacity": 8, "recognizer": {"language": "en-GB"}}"#)
                .unwrap();
        assert_eq!(config.buffer_capacity, 8);
        assert_eq!(config.recognizer.language, "en-GB");
        assert!(config.recognizer.interim_results);
        assert_eq!(config.match_threshold, 0.8);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"match_threshold": 1.5}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"buffer_capacity": 0}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("{not json"),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"error_restart_delay_ms": 250}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.error_restart_delay(), Duration::from_millis(250));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            EngineConfig::load(&missing),
            Err(EngineError::Io { .. })
        ));
    }
}
