use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionError, Actuator, Descriptor, Instruction, Location, WaitCondition};
use answer_engine::{
    AnswerResolver, AnswerSource, ExtractError, MatchMethod, MockOracle, OracleError, Question,
    QuestionExtractor,
};
use async_trait::async_trait;
use serde_json::json;

fn question(options: &[&str]) -> Question {
    Question::new(
        "Which one?",
        options.iter().map(|o| o.to_string()).collect(),
    )
    .expect("question")
}

fn resolver(oracle: MockOracle) -> AnswerResolver {
    AnswerResolver::new(Arc::new(oracle))
}

#[tokio::test]
async fn lowercase_reply_maps_exactly() {
    let q = question(&["Paris", "London", "Berlin"]);
    let response = resolver(MockOracle::default().with_replies([Ok("paris".to_string())]))
        .resolve(&q)
        .await;

    assert!(!response.is_multi_select);
    assert_eq!(response.source, AnswerSource::Oracle);
    assert_eq!(response.selections.len(), 1);
    assert_eq!(response.selections[0].text, "Paris");
    assert_eq!(response.selections[0].method, MatchMethod::Exact);
    assert_eq!(response.selection_targets(&q), vec!["Paris"]);
}

#[tokio::test]
async fn sentence_reply_maps_by_containment() {
    let q = question(&["TextView", "EditText", "Button"]);
    let response = resolver(
        MockOracle::default().with_replies([Ok("The correct answer is EditText.".to_string())]),
    )
    .resolve(&q)
    .await;

    assert_eq!(response.selections[0].text, "EditText");
    assert_eq!(response.selections[0].method, MatchMethod::Containment);
    assert!(!response.is_unmapped());
}

#[tokio::test]
async fn multi_select_reply_keeps_order() {
    let q = question(&["Option A", "Option B", "Option C"]);
    let response = resolver(
        MockOracle::default().with_replies([Ok("MULTIPLE:\nOption A\nOption B".to_string())]),
    )
    .resolve(&q)
    .await;

    assert!(response.is_multi_select);
    assert_eq!(response.selection_targets(&q), vec!["Option A", "Option B"]);
}

#[tokio::test]
async fn multi_select_duplicates_are_removed() {
    let q = question(&["Red", "Green", "Blue"]);
    let response = resolver(
        MockOracle::default().with_replies([Ok("MULTIPLE:\nred\nRed\nBlue".to_string())]),
    )
    .resolve(&q)
    .await;

    assert_eq!(response.selection_targets(&q), vec!["Red", "Blue"]);
}

#[tokio::test]
async fn unmapped_reply_falls_back_to_first_option() {
    let q = question(&["Paris", "London"]);
    let response = resolver(MockOracle::default().with_replies([Ok("Madrid".to_string())]))
        .resolve(&q)
        .await;

    assert!(response.is_unmapped());
    assert_eq!(response.selections[0].text, "Madrid");
    assert_eq!(response.selection_targets(&q), vec!["Paris"]);
}

#[tokio::test]
async fn oracle_failure_degrades_to_first_option() {
    let q = question(&["Paris", "London"]);
    let response = resolver(MockOracle::failing(OracleError::transport("connection reset")))
        .resolve(&q)
        .await;

    assert_eq!(response.source, AnswerSource::Degraded);
    assert!(response.is_unmapped());
    assert_eq!(response.selection_targets(&q), vec!["Paris"]);
}

#[tokio::test]
async fn prompt_is_sent_once_per_question() {
    let oracle = Arc::new(MockOracle::answering_index(1));
    let resolver = AnswerResolver::new(oracle.clone());
    let q = question(&["Option 1: TextView", "EditText"]);

    let response = resolver.resolve(&q).await;

    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("1. TextView"));
    assert_eq!(response.selection_targets(&q), vec!["EditText"]);
}

struct QuizPage {
    question: Option<&'static str>,
    options: Vec<&'static str>,
}

#[async_trait]
impl Actuator for QuizPage {
    async fn act(&self, _instruction: &Instruction) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("act".into()))
    }

    async fn locate(&self, instruction: &Instruction) -> Result<Vec<Descriptor>, ActionError> {
        if instruction.as_str().contains("question") {
            Ok(self
                .question
                .iter()
                .map(|text| Descriptor::new(json!({ "selector": "#q", "text": text })))
                .collect())
        } else {
            Ok(self
                .options
                .iter()
                .map(|text| Descriptor::new(json!({ "selector": "#opt", "text": text })))
                .collect())
        }
    }

    async fn invoke(&self, _descriptor: &Descriptor) -> Result<(), ActionError> {
        Ok(())
    }

    async fn read_location(&self) -> Result<Location, ActionError> {
        Ok(Location::new("https://portal/test.htm"))
    }

    async fn wait_for(&self, _c: &WaitCondition, _t: Duration) -> Result<(), ActionError> {
        Ok(())
    }

    async fn read_text(&self, descriptor: &Descriptor) -> Result<String, ActionError> {
        Ok(descriptor.as_value()["text"].as_str().unwrap_or_default().to_string())
    }
}

#[tokio::test]
async fn extractor_cleans_question_and_options() {
    let page = QuizPage {
        question: Some("Question 2 of 10 Which widget edits text?"),
        options: vec!["Option 1", "Option 1: TextView", "  ", "EditText"],
    };
    let q = QuestionExtractor::default().extract(&page).await.unwrap();
    assert_eq!(q.text(), "Which widget edits text?");
    assert_eq!(q.options(), ["TextView".to_string(), "EditText".to_string()]);
}

#[tokio::test]
async fn extractor_reports_missing_parts() {
    let no_question = QuizPage {
        question: None,
        options: vec!["A"],
    };
    assert_eq!(
        QuestionExtractor::default().extract(&no_question).await.unwrap_err(),
        ExtractError::QuestionNotFound
    );

    let no_options = QuizPage {
        question: Some("Question 1 of 3 Pick one"),
        options: vec!["Option 1", "Option 2"],
    };
    assert_eq!(
        QuestionExtractor::default().extract(&no_options).await.unwrap_err(),
        ExtractError::NoOptions
    );
}
