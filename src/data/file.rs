//! Offline question sets read from a local JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::models::Difficulty;

use super::loader::{FetchError, QuestionProvider, RawQuestion};

/// Reads a JSON array of raw questions; each fetch re-reads the file.
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl QuestionProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, difficulty: Difficulty, count: usize) -> Result<Vec<RawQuestion>, FetchError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|err| FetchError::Io {
                path: self.path.display().to_string(),
                message: err.to_string(),
            })?;

        let questions: Vec<RawQuestion> =
            serde_json::from_str(&content).map_err(|err| FetchError::Parse(err.to_string()))?;

        Ok(questions
            .into_iter()
            .filter(|q| q.difficulty == difficulty)
            .take(count)
            .collect())
    }
}
