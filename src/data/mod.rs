mod file;
mod loader;
mod opentdb;

pub use file::JsonFileProvider;
pub use loader::{
    decode_entities, load_question_set, normalize, FetchError, QuestionProvider, RawQuestion,
    DEFAULT_QUESTION_COUNT,
};
pub use opentdb::{OpenTriviaProvider, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
