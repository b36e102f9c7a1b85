//! Open Trivia DB question provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::models::Difficulty;

use super::loader::{FetchError, QuestionProvider, RawQuestion};

pub const DEFAULT_BASE_URL: &str = "https://opentdb.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The service rejects amounts above this.
const MAX_AMOUNT: usize = 50;

pub struct OpenTriviaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenTriviaProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url.trim_end_matches('/')
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base.to_string(),
            client,
        })
    }
}

#[derive(Deserialize)]
struct TriviaResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

#[async_trait]
impl QuestionProvider for OpenTriviaProvider {
    fn name(&self) -> &str {
        "opentdb"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self, difficulty: Difficulty, count: usize) -> Result<Vec<RawQuestion>, FetchError> {
        let amount = count.min(MAX_AMOUNT).to_string();
        let response = self
            .client
            .get(format!("{}/api.php", self.base_url))
            .query(&[
                ("amount", amount.as_str()),
                ("difficulty", difficulty.as_str()),
                ("type", "multiple"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Network(format!("request to {} timed out", self.base_url))
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body: TriviaResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        // Code 1 means "not enough questions"; any results that did come back are usable.
        match body.response_code {
            0 | 1 => Ok(body.results),
            code => Err(FetchError::Service(code)),
        }
    }
}
