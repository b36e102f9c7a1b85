//! Application configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{DEFAULT_BASE_URL, DEFAULT_QUESTION_COUNT, DEFAULT_TIMEOUT_SECS};
use crate::models::Difficulty;
use crate::session::DEFAULT_TIME_LIMIT_SECS;

pub const CONFIG_FILE_NAME: &str = "quizmaster.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Questions per attempt.
    pub question_count: usize,
    /// Seconds allowed per question.
    pub time_limit_secs: u32,
    pub default_difficulty: Difficulty,
    /// Base URL of the trivia service.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Where high scores, the last attempt and the log file live.
    pub data_dir: PathBuf,
    /// Play offline from this question file instead of the trivia service.
    pub questions_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            default_difficulty: Difficulty::default(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: PathBuf::from(".quizmaster"),
            questions_file: None,
        }
    }
}

impl Config {
    /// Load from an explicit path, else `./quizmaster.toml`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) if p.exists() => p.to_path_buf(),
            Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if !local.exists() {
                    return Ok(Self::default());
                }
                local
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_count == 0 {
            return Err(ConfigError::Invalid(
                "question_count must be at least 1".to_string(),
            ));
        }
        if self.time_limit_secs == 0 {
            return Err(ConfigError::Invalid(
                "time_limit_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn high_scores_path(&self) -> PathBuf {
        self.data_dir.join("high_scores.json")
    }

    pub fn last_attempt_path(&self) -> PathBuf {
        self.data_dir.join("last_attempt.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("quizmaster.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "time_limit_secs = 20\ndefault_difficulty = \"hard\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.time_limit_secs, 20);
        assert_eq!(config.default_difficulty, Difficulty::Hard);
        assert_eq!(config.question_count, 10);
        assert_eq!(config.api_base_url, "https://opentdb.com");
        assert_eq!(
            config.high_scores_path(),
            PathBuf::from(".quizmaster/high_scores.json")
        );
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nope/quizmaster.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_zero_question_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "question_count = 0\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "question_count = \"many\"\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
