use serde::Serialize;
use std::fmt;

use crate::errors::ExtractError;

/// One question as shown by the interface
///
/// Options keep their on-screen order and are never empty. Questions are
/// read fresh on every iteration and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    text: String,
    options: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, options: Vec<String>) -> Result<Self, ExtractError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyQuestion);
        }
        if options.is_empty() {
            return Err(ExtractError::NoOptions);
        }
        Ok(Self { text, options })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// First option; always present
    pub fn first_option(&self) -> &str {
        &self.options[0]
    }
}

/// What is sent to the oracle for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleRequest {
    pub question: String,
    pub options: Vec<String>,
    pub prompt: String,
}

/// How a candidate answer was mapped onto an option
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Containment,
    TokenOverlap { confidence: f32 },
    Similarity { score: f32 },
    Unmapped,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Containment => "containment",
            MatchMethod::TokenOverlap { .. } => "token_overlap",
            MatchMethod::Similarity { .. } => "similarity",
            MatchMethod::Unmapped => "unmapped",
        }
    }

    pub fn is_mapped(&self) -> bool {
        !matches!(self, MatchMethod::Unmapped)
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::TokenOverlap { confidence } => {
                write!(f, "token_overlap({confidence:.2})")
            }
            MatchMethod::Similarity { score } => write!(f, "similarity({score:.2})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Where the answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Oracle,
    /// The oracle failed; option 0 was chosen without consulting it
    Degraded,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Oracle => "oracle",
            AnswerSource::Degraded => "degraded",
        }
    }
}

/// One chosen answer
///
/// `text` is the canonical option text when mapped, the oracle's raw
/// candidate otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub text: String,
    pub option_index: Option<usize>,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResponse {
    pub is_multi_select: bool,
    /// Never empty; exactly one entry for single-select
    pub selections: Vec<Selection>,
    pub source: AnswerSource,
}

impl AnswerResponse {
    /// True when any selection could not be mapped onto an option
    pub fn is_unmapped(&self) -> bool {
        self.selections.iter().any(|s| !s.method.is_mapped())
    }

    /// Option texts to select, in order
    ///
    /// Unmapped selections are skipped; when nothing maps, the question's
    /// first option is the deterministic fallback.
    pub fn selection_targets(&self, question: &Question) -> Vec<String> {
        let targets: Vec<String> = self
            .selections
            .iter()
            .filter_map(|selection| selection.option_index)
            .filter_map(|index| question.options().get(index).cloned())
            .collect();
        if targets.is_empty() {
            vec![question.first_option().to_string()]
        } else {
            targets
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(
            "Capital of France?",
            vec!["Paris".into(), "London".into(), "Berlin".into()],
        )
        .unwrap()
    }

    #[test]
    fn question_requires_options_and_text() {
        assert_eq!(
            Question::new("Q", Vec::new()).unwrap_err(),
            ExtractError::NoOptions
        );
        assert_eq!(
            Question::new("  ", vec!["a".into()]).unwrap_err(),
            ExtractError::EmptyQuestion
        );
    }

    #[test]
    fn unmapped_targets_fall_back_to_first_option() {
        let response = AnswerResponse {
            is_multi_select: false,
            selections: vec![Selection {
                text: "Madrid".into(),
                option_index: None,
                method: MatchMethod::Unmapped,
            }],
            source: AnswerSource::Oracle,
        };
        assert!(response.is_unmapped());
        assert_eq!(response.selection_targets(&question()), vec!["Paris"]);
    }

    #[test]
    fn mapped_targets_skip_unmapped_entries() {
        let response = AnswerResponse {
            is_multi_select: true,
            selections: vec![
                Selection {
                    text: "Berlin".into(),
                    option_index: Some(2),
                    method: MatchMethod::Exact,
                },
                Selection {
                    text: "Rome".into(),
                    option_index: None,
                    method: MatchMethod::Unmapped,
                },
            ],
            source: AnswerSource::Oracle,
        };
        assert_eq!(response.selection_targets(&question()), vec!["Berlin"]);
    }

    #[test]
    fn method_labels() {
        assert_eq!(
            MatchMethod::TokenOverlap { confidence: 0.5 }.to_string(),
            "token_overlap(0.50)"
        );
        assert_eq!(MatchMethod::Exact.to_string(), "exact");
    }
}
