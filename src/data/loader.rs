use std::collections::HashSet;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Difficulty, Question, NUM_OPTIONS};

pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Why a question set could not be loaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("question count must be at least 1")]
    InvalidCount,

    #[error("network error: {0}")]
    Network(String),

    #[error("question service returned HTTP {0}")]
    Http(u16),

    #[error("question service reported code {0}")]
    Service(u8),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse questions: {0}")]
    Parse(String),

    #[error("no valid {difficulty} questions available")]
    NoQuestions { difficulty: Difficulty },
}

/// A question as delivered by a provider, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub category: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Source of raw questions.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch up to `count` raw questions. A single attempt, no retries.
    async fn fetch(&self, difficulty: Difficulty, count: usize) -> Result<Vec<RawQuestion>, FetchError>;
}

/// Fetch, validate and normalize a question set.
///
/// Fewer than `count` valid questions is still a success; none at all is a
/// [`FetchError::NoQuestions`].
pub async fn load_question_set<R: Rng>(
    provider: &dyn QuestionProvider,
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, FetchError> {
    if count == 0 {
        return Err(FetchError::InvalidCount);
    }

    debug!(provider = provider.name(), %difficulty, count, "fetching questions");
    let raw = provider.fetch(difficulty, count).await?;
    let questions = normalize(raw, difficulty, count, rng);

    if questions.is_empty() {
        warn!(provider = provider.name(), %difficulty, "provider returned no usable questions");
        return Err(FetchError::NoQuestions { difficulty });
    }
    if questions.len() < count {
        warn!(
            requested = count,
            loaded = questions.len(),
            "provider supplied fewer questions than requested"
        );
    }

    info!(loaded = questions.len(), %difficulty, "question set ready");
    Ok(questions)
}

/// Turn raw records into questions, dropping any that fail validation.
///
/// Options are shuffled with `rng`; ids are assigned in order from zero.
pub fn normalize<R: Rng>(
    raw: Vec<RawQuestion>,
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    raw.into_iter()
        .filter_map(|record| build_question(record, difficulty, rng))
        .take(count)
        .enumerate()
        .map(|(id, mut question)| {
            question.id = id as u32;
            question
        })
        .collect()
}

fn build_question<R: Rng>(record: RawQuestion, difficulty: Difficulty, rng: &mut R) -> Option<Question> {
    let text = decode_entities(record.question.trim());
    let correct = decode_entities(record.correct_answer.trim());
    if text.is_empty() || record.difficulty != difficulty {
        debug!(question = %text, "dropping question: empty or wrong difficulty");
        return None;
    }

    let mut options: Vec<String> = record
        .incorrect_answers
        .iter()
        .map(|answer| decode_entities(answer.trim()))
        .collect();
    options.push(correct.clone());

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if options.len() != NUM_OPTIONS
        || distinct.len() != NUM_OPTIONS
        || options.iter().any(|o| o.is_empty())
    {
        debug!(question = %text, "dropping question: options are not four distinct answers");
        return None;
    }

    options.shuffle(rng);
    let correct_option_index = options.iter().position(|o| *o == correct)?;
    let options: [String; NUM_OPTIONS] = options.try_into().ok()?;

    Some(Question {
        id: 0,
        text,
        options,
        correct_option_index,
        category: decode_entities(record.category.trim()),
        difficulty,
    })
}

/// Decode the HTML entities the trivia service embeds in its text.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match candidate.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&candidate[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &candidate[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &candidate[1..];
                }
            },
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value);
    }

    Some(match name {
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "lt" => '<',
        "gt" => '>',
        "nbsp" => '\u{a0}',
        "shy" => '\u{ad}',
        "eacute" => 'é',
        "Eacute" => 'É',
        "aacute" => 'á',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "ntilde" => 'ñ',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "auml" => 'ä',
        "ldquo" => '“',
        "rdquo" => '”',
        "lsquo" => '‘',
        "rsquo" => '’',
        "hellip" => '…',
        "deg" => '°',
        "pi" => 'π',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn raw(question: &str, correct: &str, incorrect: &[&str]) -> RawQuestion {
        RawQuestion {
            category: "Science &amp; Nature".to_string(),
            difficulty: Difficulty::Medium,
            question: question.to_string(),
            correct_answer: correct.to_string(),
            incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
        }
    }

    struct FixedProvider(Vec<RawQuestion>);

    #[async_trait]
    impl QuestionProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _: Difficulty, _: usize) -> Result<Vec<RawQuestion>, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct DownProvider;

    #[async_trait]
    impl QuestionProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn fetch(&self, _: Difficulty, _: usize) -> Result<Vec<RawQuestion>, FetchError> {
            Err(FetchError::Network("connection refused".to_string()))
        }
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("&quot;Hello&quot; &amp; it&#039;s &lt;ok&gt;"),
            "\"Hello\" & it's <ok>"
        );
        assert_eq!(decode_entities("Pok&eacute;mon &#x41;"), "Pokémon A");
        assert_eq!(decode_entities("R&D & more &bogus;"), "R&D & more &bogus;");
    }

    #[test]
    fn test_normalize_shuffles_but_tracks_correct_answer() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = (0..20)
            .map(|i| raw(&format!("Q{}", i), "right", &["w1", "w2", "w3"]))
            .collect();

        let questions = normalize(records, Difficulty::Medium, 20, &mut rng);
        assert_eq!(questions.len(), 20);
        for (i, question) in questions.iter().enumerate() {
            assert_eq!(question.id, i as u32);
            assert_eq!(question.correct_option(), Some("right"));
            assert_eq!(question.category, "Science & Nature");
        }
        let positions: HashSet<usize> =
            questions.iter().map(|q| q.correct_option_index).collect();
        assert!(positions.len() > 1);
    }

    #[test]
    fn test_normalize_drops_invalid_records() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut wrong_difficulty = raw("Q4", "a", &["b", "c", "d"]);
        wrong_difficulty.difficulty = Difficulty::Hard;
        let records = vec![
            raw("Q0", "a", &["b", "c", "d"]),
            raw("Q1", "a", &["a", "c", "d"]),
            raw("Q2", "a", &["b", "c"]),
            raw("   ", "a", &["b", "c", "d"]),
            wrong_difficulty,
            raw("Q5", "True", &["False", "Maybe", "&quot;True&quot;"]),
        ];

        let questions = normalize(records, Difficulty::Medium, 10, &mut rng);
        let texts: Vec<&str> = questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["Q0", "Q5"]);
        assert_eq!(questions[1].id, 1);
    }

    #[tokio::test]
    async fn test_load_caps_at_count() {
        let provider = FixedProvider(
            (0..15)
                .map(|i| raw(&format!("Q{}", i), "a", &["b", "c", "d"]))
                .collect(),
        );
        let mut rng = StdRng::seed_from_u64(3);

        let questions = load_question_set(&provider, Difficulty::Medium, 10, &mut rng)
            .await
            .unwrap();
        assert_eq!(questions.len(), 10);
    }

    #[tokio::test]
    async fn test_load_accepts_short_set() {
        let provider = FixedProvider(vec![
            raw("Q0", "a", &["b", "c", "d"]),
            raw("Q1", "a", &["b", "b", "d"]),
            raw("Q2", "a", &["b", "c", "d"]),
        ]);
        let mut rng = StdRng::seed_from_u64(3);

        let questions = load_question_set(&provider, Difficulty::Medium, 10, &mut rng)
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn test_load_fails_without_valid_questions() {
        let provider = FixedProvider(vec![raw("Q0", "a", &["a", "a", "a"])]);
        let mut rng = StdRng::seed_from_u64(3);

        let err = load_question_set(&provider, Difficulty::Medium, 10, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::NoQuestions {
                difficulty: Difficulty::Medium
            }
        ));
    }

    #[tokio::test]
    async fn test_load_surfaces_provider_failure() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = load_question_set(&DownProvider, Difficulty::Easy, 10, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));

        let err = load_question_set(&DownProvider, Difficulty::Easy, 0, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidCount));
    }
}
