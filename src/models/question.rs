use serde::{Deserialize, Serialize};

use super::Difficulty;

/// Number of options every question carries.
pub const NUM_OPTIONS: usize = 4;

/// A normalized multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub text: String,
    pub options: [String; NUM_OPTIONS],
    #[serde(rename = "correctAnswer")]
    pub correct_option_index: usize,
    pub category: String,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_option_index)
    }

    /// Text of the correct option; `None` if the index is out of range.
    pub fn correct_option(&self) -> Option<&str> {
        self.option(self.correct_option_index)
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}
