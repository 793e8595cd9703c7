/// Leading sentinel of a multi-select oracle reply
pub const MULTI_SELECT_MARKER: &str = "MULTIPLE:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub is_multi_select: bool,
    /// Raw candidate answers in reply order
    pub candidates: Vec<String>,
}

/// Split an oracle reply into candidate answers
///
/// A trimmed reply starting with the marker yields one candidate per
/// non-empty line after it. Anything else is a single candidate.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let trimmed = raw.trim();
    match trimmed.strip_prefix(MULTI_SELECT_MARKER) {
        Some(rest) => ParsedResponse {
            is_multi_select: true,
            candidates: rest
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        },
        None => ParsedResponse {
            is_multi_select: false,
            candidates: if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            },
        },
    }
}
