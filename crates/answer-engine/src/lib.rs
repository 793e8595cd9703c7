//! Answer resolution
//!
//! Turns a question shown by the remote interface into the option text(s)
//! to select: the question and its options are read through the actuator,
//! an oracle is asked once, and its free-text reply is mapped back onto the
//! finite option list. Resolution never fails; an unreachable oracle or an
//! unmappable reply degrades to a deterministic first-option choice.

pub mod errors;
pub mod extract;
pub mod matching;
pub mod model;
pub mod openai;
pub mod oracle;
pub mod parse;
pub mod prompt;
pub mod resolver;

pub use errors::{ExtractError, OracleError};
pub use extract::QuestionExtractor;
pub use matching::{MatchOutcome, OptionMatcher};
pub use model::{AnswerResponse, AnswerSource, MatchMethod, OracleRequest, Question, Selection};
pub use openai::{OpenAiConfig, OpenAiOracle};
pub use oracle::{MockOracle, Oracle};
pub use parse::{parse_response, ParsedResponse, MULTI_SELECT_MARKER};
pub use prompt::{clean_option, PromptBuilder};
pub use resolver::AnswerResolver;
