mod difficulty;
mod question;

pub use difficulty::{Difficulty, ParseDifficultyError};
pub use question::{Question, NUM_OPTIONS};
