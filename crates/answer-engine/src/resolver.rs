use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::matching::OptionMatcher;
use crate::model::{AnswerResponse, AnswerSource, MatchMethod, OracleRequest, Question, Selection};
use crate::oracle::Oracle;
use crate::parse::parse_response;
use crate::prompt::PromptBuilder;

/// Question in, selections out; never fails
pub struct AnswerResolver {
    oracle: Arc<dyn Oracle>,
    prompt: PromptBuilder,
    matcher: OptionMatcher,
}

impl AnswerResolver {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            prompt: PromptBuilder::new(),
            matcher: OptionMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: OptionMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn matcher(&self) -> &OptionMatcher {
        &self.matcher
    }

    #[instrument(skip_all, fields(options = question.options().len()))]
    pub async fn resolve(&self, question: &Question) -> AnswerResponse {
        let request = OracleRequest {
            question: question.text().to_string(),
            options: question.options().to_vec(),
            prompt: self.prompt.render(question),
        };
        debug!(question = %preview(question.text()), "querying oracle");

        let raw = match self.oracle.ask(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "oracle unavailable; selecting first option");
                return degraded(question);
            }
        };
        debug!(reply = %preview(&raw), "oracle replied");

        let parsed = parse_response(&raw);
        let mut selections: Vec<Selection> = Vec::with_capacity(parsed.candidates.len());
        for candidate in &parsed.candidates {
            let outcome = self.matcher.match_candidate(candidate, question.options());
            let selection = match outcome.option_index {
                Some(index) => Selection {
                    text: question.options()[index].clone(),
                    option_index: Some(index),
                    method: outcome.method,
                },
                None => Selection {
                    text: candidate.clone(),
                    option_index: None,
                    method: MatchMethod::Unmapped,
                },
            };
            if !selections.iter().any(|existing| same_target(existing, &selection)) {
                selections.push(selection);
            }
            if !parsed.is_multi_select {
                break;
            }
        }

        if selections.is_empty() {
            selections.push(Selection {
                text: raw.trim().to_string(),
                option_index: None,
                method: MatchMethod::Unmapped,
            });
        }

        let response = AnswerResponse {
            is_multi_select: parsed.is_multi_select,
            selections,
            source: AnswerSource::Oracle,
        };
        if response.is_unmapped() {
            warn!(reply = %preview(&raw), "oracle answer not mapped onto any option");
        } else {
            info!(
                multi = response.is_multi_select,
                selections = response.selections.len(),
                "answer resolved"
            );
        }
        response
    }
}

fn same_target(a: &Selection, b: &Selection) -> bool {
    match (a.option_index, b.option_index) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.text == b.text,
        _ => false,
    }
}

fn degraded(question: &Question) -> AnswerResponse {
    AnswerResponse {
        is_multi_select: false,
        selections: vec![Selection {
            text: question.first_option().to_string(),
            option_index: Some(0),
            method: MatchMethod::Unmapped,
        }],
        source: AnswerSource::Degraded,
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 100;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}
