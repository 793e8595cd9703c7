//! Mapping free-text oracle answers onto a finite option list

use crate::model::MatchMethod;
use crate::prompt::clean_option;

/// Result of mapping one candidate answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub option_index: Option<usize>,
    pub method: MatchMethod,
}

impl MatchOutcome {
    fn mapped(index: usize, method: MatchMethod) -> Self {
        Self {
            option_index: Some(index),
            method,
        }
    }

    fn unmapped() -> Self {
        Self {
            option_index: None,
            method: MatchMethod::Unmapped,
        }
    }
}

/// Staged matcher: exact, containment, token overlap, positional similarity
///
/// The thresholds are heuristics kept configurable; changing them changes
/// which option gets selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionMatcher {
    /// Tokens must be strictly longer than this to count as overlap
    pub min_token_len: usize,
    /// Positional similarity must be strictly above this
    pub similarity_threshold: f32,
}

impl Default for OptionMatcher {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            similarity_threshold: 0.6,
        }
    }
}

impl OptionMatcher {
    pub fn new(min_token_len: usize, similarity_threshold: f32) -> Self {
        Self {
            min_token_len,
            similarity_threshold,
        }
    }

    pub fn match_candidate(&self, candidate: &str, options: &[String]) -> MatchOutcome {
        let candidate = normalize(candidate);
        if candidate.is_empty() {
            return MatchOutcome::unmapped();
        }
        let normalized: Vec<String> = options.iter().map(|o| normalize(&clean_option(o))).collect();

        if let Some(index) = normalized.iter().position(|option| *option == candidate) {
            return MatchOutcome::mapped(index, MatchMethod::Exact);
        }

        if let Some(index) = normalized.iter().position(|option| {
            !option.is_empty() && (option.contains(&candidate) || candidate.contains(option.as_str()))
        }) {
            return MatchOutcome::mapped(index, MatchMethod::Containment);
        }

        if let Some(outcome) = self.token_overlap(&candidate, &normalized) {
            return outcome;
        }

        self.similarity(&candidate, &normalized)
            .unwrap_or_else(MatchOutcome::unmapped)
    }

    fn token_overlap(&self, candidate: &str, options: &[String]) -> Option<MatchOutcome> {
        let tokens = tokenize(candidate);
        if tokens.is_empty() {
            return None;
        }
        let significant: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|token| token.chars().count() > self.min_token_len)
            .collect();
        if significant.is_empty() {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        for (index, option) in options.iter().enumerate() {
            let option_tokens = tokenize(option);
            let matched = significant
                .iter()
                .filter(|token| option_tokens.contains(*token))
                .count();
            if matched > best.map_or(0, |(_, count)| count) {
                best = Some((index, matched));
            }
        }

        best.map(|(index, matched)| {
            let confidence = matched as f32 / tokens.len() as f32;
            MatchOutcome::mapped(index, MatchMethod::TokenOverlap { confidence })
        })
    }

    fn similarity(&self, candidate: &str, options: &[String]) -> Option<MatchOutcome> {
        let mut best: Option<(usize, f32)> = None;
        for (index, option) in options.iter().enumerate() {
            let score = positional_similarity(candidate, option);
            if score > self.similarity_threshold && score > best.map_or(0.0, |(_, s)| s) {
                best = Some((index, score));
            }
        }
        best.map(|(index, score)| MatchOutcome::mapped(index, MatchMethod::Similarity { score }))
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Characters equal at the same index, over the longer length
fn positional_similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f32 / longest as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_ignores_case() {
        let outcome =
            OptionMatcher::default().match_candidate("paris", &options(&["Paris", "London", "Berlin"]));
        assert_eq!(outcome, MatchOutcome::mapped(0, MatchMethod::Exact));
    }

    #[test]
    fn containment_in_either_direction() {
        let matcher = OptionMatcher::default();
        let opts = options(&["TextView", "EditText", "Button"]);
        assert_eq!(
            matcher.match_candidate("The correct answer is EditText.", &opts),
            MatchOutcome::mapped(1, MatchMethod::Containment)
        );
        assert_eq!(
            matcher.match_candidate("Butt", &opts),
            MatchOutcome::mapped(2, MatchMethod::Containment)
        );
    }

    #[test]
    fn token_overlap_picks_highest_count() {
        let matcher = OptionMatcher::default();
        let opts = options(&[
            "Stores data on the device",
            "Renders layout resources quickly",
            "Handles network requests",
        ]);
        let outcome = matcher.match_candidate("it renders the layout", &opts);
        assert_eq!(outcome.option_index, Some(1));
        match outcome.method {
            MatchMethod::TokenOverlap { confidence } => {
                assert!((confidence - 0.5).abs() < f32::EPSILON)
            }
            other => panic!("unexpected method {other:?}"),
        }
    }

    #[test]
    fn short_tokens_do_not_count() {
        let matcher = OptionMatcher::default();
        let opts = options(&["the red car", "the big van"]);
        assert_eq!(
            matcher.match_candidate("a big cat", &opts).method,
            MatchMethod::Unmapped
        );
    }

    #[test]
    fn positional_similarity_above_threshold() {
        let matcher = OptionMatcher::default();
        let opts = options(&["Colour", "Shape"]);
        let outcome = matcher.match_candidate("Color", &opts);
        assert_eq!(outcome.option_index, Some(0));
        assert!(matches!(outcome.method, MatchMethod::Similarity { .. }));
    }

    #[test]
    fn nothing_close_is_unmapped() {
        let outcome = OptionMatcher::default().match_candidate("Madrid", &options(&["Paris", "London"]));
        assert_eq!(outcome, MatchOutcome::unmapped());
    }

    #[test]
    fn option_labels_are_ignored_when_matching() {
        let outcome = OptionMatcher::default()
            .match_candidate("TextView", &options(&["Option 1: TextView", "Option 2: EditText"]));
        assert_eq!(outcome, MatchOutcome::mapped(0, MatchMethod::Exact));
    }

    #[test]
    fn empty_candidate_never_matches() {
        assert_eq!(
            OptionMatcher::default().match_candidate("   ", &options(&["", "a"])),
            MatchOutcome::unmapped()
        );
    }
}
