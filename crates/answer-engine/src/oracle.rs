use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::OracleError;
use crate::model::OracleRequest;
use crate::parse::MULTI_SELECT_MARKER;

/// Stateless question-answering service; one request per question
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn ask(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

#[derive(Debug, Clone)]
enum MockBehaviour {
    /// Answer with the option text at this index (clamped to the last option)
    OptionAt(usize),
    /// Answer with every listed option index as a multi-select reply
    OptionsAt(Vec<usize>),
    Fail(OracleError),
}

/// Deterministic oracle used for tests and offline runs.
///
/// Scripted replies are consumed first, in order; afterwards the fallback
/// behaviour answers every request.
#[derive(Debug)]
pub struct MockOracle {
    scripted: Mutex<VecDeque<Result<String, OracleError>>>,
    fallback: MockBehaviour,
    requests: Mutex<Vec<OracleRequest>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::answering_index(0)
    }
}

impl MockOracle {
    fn with_behaviour(fallback: MockBehaviour) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answering_index(index: usize) -> Self {
        Self::with_behaviour(MockBehaviour::OptionAt(index))
    }

    pub fn answering_indices(indices: Vec<usize>) -> Self {
        Self::with_behaviour(MockBehaviour::OptionsAt(indices))
    }

    pub fn failing(error: OracleError) -> Self {
        Self::with_behaviour(MockBehaviour::Fail(error))
    }

    /// Queue raw replies returned before the fallback behaviour applies
    pub fn with_replies<I>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, OracleError>>,
    {
        self.scripted.lock().extend(replies);
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        self.requests.lock().push(request.clone());
        if let Some(reply) = self.scripted.lock().pop_front() {
            return reply;
        }

        let pick = |index: usize| -> Result<String, OracleError> {
            request
                .options
                .get(index.min(request.options.len().saturating_sub(1)))
                .cloned()
                .ok_or_else(|| OracleError::invalid_request("request has no options"))
        };

        match &self.fallback {
            MockBehaviour::OptionAt(index) => pick(*index),
            MockBehaviour::OptionsAt(indices) => {
                let answers = indices
                    .iter()
                    .map(|index| pick(*index))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{MULTI_SELECT_MARKER}\n{}", answers.join("\n")))
            }
            MockBehaviour::Fail(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn request() -> OracleRequest {
        OracleRequest {
            question: "Pick".into(),
            options: vec!["A".into(), "B".into(), "C".into()],
            prompt: String::new(),
        }
    }

    #[test]
    fn scripted_replies_come_first() {
        let oracle = MockOracle::answering_index(1).with_replies([Ok("scripted".to_string())]);
        assert_eq!(block_on(oracle.ask(&request())).unwrap(), "scripted");
        assert_eq!(block_on(oracle.ask(&request())).unwrap(), "B");
        assert_eq!(oracle.requests().len(), 2);
    }

    #[test]
    fn index_is_clamped_to_last_option() {
        let oracle = MockOracle::answering_index(9);
        assert_eq!(block_on(oracle.ask(&request())).unwrap(), "C");
    }

    #[test]
    fn multi_select_reply_uses_marker() {
        let oracle = MockOracle::answering_indices(vec![0, 2]);
        assert_eq!(block_on(oracle.ask(&request())).unwrap(), "MULTIPLE:\nA\nC");
    }
}
