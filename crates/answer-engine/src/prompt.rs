use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Question;
use crate::parse::MULTI_SELECT_MARKER;

static OPTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^option\s*\d+:?\s*").expect("option prefix regex"));

/// Strip a leading `Option N:` label some interfaces render inside the option text
pub fn clean_option(option: &str) -> String {
    OPTION_PREFIX.replace(option.trim(), "").trim().to_string()
}

/// Fixed oracle prompt template
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            system: "You are an expert assistant answering multiple-choice assessment questions."
                .to_string(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    pub fn render(&self, question: &Question) -> String {
        let options = question
            .options()
            .iter()
            .enumerate()
            .map(|(index, option)| format!("{}. {}", index + 1, clean_option(option)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Given the following question and options, identify the correct answer(s).\n\
             \n\
             First decide whether this is a single-select question (exactly one correct \
             option) or a multiple-select question (more than one correct option).\n\
             \n\
             If it is single-select, return ONLY the exact text of the correct option as it \
             appears below, without numbering or prefixes.\n\
             If it is multiple-select, start your answer with \"{marker}\" followed by each \
             correct option's exact text on its own line.\n\
             \n\
             Question: {question}\n\
             \n\
             Options:\n\
             {options}\n\
             \n\
             Correct Answer:",
            marker = MULTI_SELECT_MARKER,
            question = question.text().trim(),
            options = options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_option_labels() {
        assert_eq!(clean_option("Option 2: EditText"), "EditText");
        assert_eq!(clean_option("option3 Button"), "Button");
        assert_eq!(clean_option("Option A"), "Option A");
        assert_eq!(clean_option("  Paris "), "Paris");
    }

    #[test]
    fn render_lists_numbered_options_and_marker() {
        let question = Question::new(
            "Which widget displays editable text?",
            vec!["Option 1: TextView".into(), "EditText".into()],
        )
        .unwrap();
        let prompt = PromptBuilder::new().render(&question);
        assert!(prompt.contains("Question: Which widget displays editable text?"));
        assert!(prompt.contains("1. TextView\n2. EditText"));
        assert!(prompt.contains("MULTIPLE:"));
    }
}
