use action_primitives::Actuator;
use once_cell::sync::Lazy;
use pilot_core_types::Instruction;
use regex::Regex;
use tracing::{debug, instrument};

use crate::errors::ExtractError;
use crate::model::Question;
use crate::prompt::clean_option;

static QUESTION_COUNTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*question\s+\d+\s+of\s+\d+\s*").expect("question counter regex")
});
static BARE_OPTION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^option\s*\d+$").expect("bare option label regex"));

/// Reads the current question through read-only actuator queries
#[derive(Debug, Clone)]
pub struct QuestionExtractor {
    question_hint: Instruction,
    options_hint: Instruction,
}

impl Default for QuestionExtractor {
    fn default() -> Self {
        Self::new(
            Instruction::new("the question text on the quiz page"),
            Instruction::new("all answer options on the quiz page"),
        )
    }
}

impl QuestionExtractor {
    pub fn new(question_hint: Instruction, options_hint: Instruction) -> Self {
        Self {
            question_hint,
            options_hint,
        }
    }

    #[instrument(skip_all)]
    pub async fn extract(&self, actuator: &dyn Actuator) -> Result<Question, ExtractError> {
        let located = actuator.locate(&self.question_hint).await?;
        let first = located.first().ok_or(ExtractError::QuestionNotFound)?;
        let raw = actuator.read_text(first).await?;
        let text = strip_question_counter(&raw);
        if text.is_empty() {
            return Err(ExtractError::EmptyQuestion);
        }

        let mut options = Vec::new();
        for descriptor in actuator.locate(&self.options_hint).await? {
            match actuator.read_text(&descriptor).await {
                Ok(label) => {
                    if let Some(option) = clean_label(&label) {
                        options.push(option);
                    }
                }
                Err(err) if !err.is_retryable() => return Err(err.into()),
                Err(err) => debug!(%err, %descriptor, "skipping unreadable option"),
            }
        }
        debug!(options = options.len(), "question extracted");
        Question::new(text, options)
    }
}

fn strip_question_counter(raw: &str) -> String {
    QUESTION_COUNTER.replace(raw.trim(), "").trim().to_string()
}

/// `None` for empty text and bare `Option N` placeholders
fn clean_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() || BARE_OPTION_LABEL.is_match(trimmed) {
        return None;
    }
    let cleaned = clean_option(trimmed);
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_prefix_removed() {
        assert_eq!(
            strip_question_counter("Question 3 of 10  Which widget shows text?"),
            "Which widget shows text?"
        );
        assert_eq!(strip_question_counter("What is 2+2?"), "What is 2+2?");
    }

    #[test]
    fn placeholder_labels_dropped() {
        assert_eq!(clean_label("Option 2"), None);
        assert_eq!(clean_label("   "), None);
        assert_eq!(clean_label("Option 1: TextView"), Some("TextView".into()));
        assert_eq!(clean_label("EditText"), Some("EditText".into()));
    }
}
