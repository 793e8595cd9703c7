//! In-process assessment portal
//!
//! `PortalSimulation` implements [`Actuator`] over a small screen graph:
//!
//! ```text
//! login -> home -> menu -> assessment list -> [key prompt] -> ready
//!       -> question 1..N -> confirm end -> assessment list
//! ```
//!
//! Elements are recognised in instructions by keyword, the same way a
//! semantic driver would resolve them. The simulation can be told to reject
//! direct clicks or direct typing (forcing the locate-and-invoke path), to
//! require an assessment key, and to render some questions without answer
//! options.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use action_primitives::{
    ActionError, Actuator, Descriptor, Instruction, Location, WaitCondition,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use crate::config::{PilotConfig, PortalConfig};

const OPTION_WORDS: [&str; 4] = ["Alpha", "Bravo", "Charlie", "Delta"];
const LOGIN_ERROR: &str = "Invalid username or password";

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Key prompt is shown after Start only when set
    pub assessment_key: Option<String>,
    pub assessments: u32,
    pub questions: u32,
    /// Reject every direct click so actions go through locate-and-invoke
    pub direct_fails: bool,
    /// Reject direct typing so values are filled into located fields
    pub direct_typing_fails: bool,
    /// Every diagnostic capture fails
    pub capture_fails: bool,
    /// 1-based question numbers rendered without answer options
    pub broken_questions: BTreeSet<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://portal.example".to_string(),
            username: "student".to_string(),
            password: "secret".to_string(),
            assessment_key: None,
            assessments: 1,
            questions: 10,
            direct_fails: false,
            direct_typing_fails: false,
            capture_fails: false,
            broken_questions: BTreeSet::new(),
        }
    }
}

impl SimulationConfig {
    pub fn login_url(&self) -> String {
        format!("{}/login.htm", self.base_url)
    }

    /// Point a session configuration at this portal
    pub fn apply_to(&self, config: &mut PilotConfig) {
        config.portal.login_url = self.login_url();
        config.portal.home_marker = "home.htm".to_string();
        config.portal.navigation = PortalConfig::default().navigation;
        config.credentials.username = self.username.clone();
        config.credentials.password = self.password.clone();
        config.assessment.key = self.assessment_key.clone();
        config.assessment.question_count = self.questions;
    }
}

/// One recorded actuator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    Act(String),
    Locate(String),
    Invoke(String),
    /// Element id only; typed values are never recorded
    Fill(String),
    ReadText(String),
    ReadLocation,
    Wait,
    Mark(usize),
    ClearMarks,
    Capture(String),
}

impl SimCall {
    /// `act`, `locate`, `invoke` and `fill`; the calls that count as interaction
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            SimCall::Act(_) | SimCall::Locate(_) | SimCall::Invoke(_) | SimCall::Fill(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Login,
    Home,
    MenuOpen,
    AssessmentList,
    KeyPrompt,
    Ready,
    Question(u32),
    ConfirmEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    UsernameField,
    PasswordField,
    LoginButton,
    AcademicMenu,
    OnlineAssessmentLink,
    StartButton,
    KeyField,
    VerifyButton,
    StartAssessmentButton,
    QuestionText,
    AnswerOptions,
    AnswerOption(usize),
    SaveNext,
    EndTest,
    ConfirmPrompt,
    ConfirmYes,
}

impl Element {
    fn id(&self) -> String {
        match self {
            Element::UsernameField => "username".into(),
            Element::PasswordField => "password".into(),
            Element::LoginButton => "login".into(),
            Element::AcademicMenu => "academic-functions".into(),
            Element::OnlineAssessmentLink => "online-assessment".into(),
            Element::StartButton => "start".into(),
            Element::KeyField => "assessment-key".into(),
            Element::VerifyButton => "verify".into(),
            Element::StartAssessmentButton => "start-assessment".into(),
            Element::QuestionText => "question".into(),
            Element::AnswerOptions => "options".into(),
            Element::AnswerOption(index) => format!("option-{index}"),
            Element::SaveNext => "save-next".into(),
            Element::EndTest => "end-test".into(),
            Element::ConfirmPrompt => "confirm-end".into(),
            Element::ConfirmYes => "confirm-yes".into(),
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        let element = match id {
            "username" => Element::UsernameField,
            "password" => Element::PasswordField,
            "login" => Element::LoginButton,
            "academic-functions" => Element::AcademicMenu,
            "online-assessment" => Element::OnlineAssessmentLink,
            "start" => Element::StartButton,
            "assessment-key" => Element::KeyField,
            "verify" => Element::VerifyButton,
            "start-assessment" => Element::StartAssessmentButton,
            "question" => Element::QuestionText,
            "options" => Element::AnswerOptions,
            "save-next" => Element::SaveNext,
            "end-test" => Element::EndTest,
            "confirm-end" => Element::ConfirmPrompt,
            "confirm-yes" => Element::ConfirmYes,
            other => Element::AnswerOption(other.strip_prefix("option-")?.parse().ok()?),
        };
        Some(element)
    }
}

#[derive(Debug)]
struct SimState {
    screen: Screen,
    typed_username: String,
    typed_password: String,
    typed_key: String,
    completed: u32,
    rejected_logins: u32,
    login_error: Option<String>,
    answers: BTreeMap<(u32, u32), Vec<String>>,
    calls: Vec<SimCall>,
    outstanding_marks: usize,
}

pub struct PortalSimulation {
    config: SimulationConfig,
    state: Mutex<SimState>,
}

impl PortalSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimState {
                screen: Screen::Blank,
                typed_username: String::new(),
                typed_password: String::new(),
                typed_key: String::new(),
                completed: 0,
                rejected_logins: 0,
                login_error: None,
                answers: BTreeMap::new(),
                calls: Vec::new(),
                outstanding_marks: 0,
            }),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.state.lock().calls.clone()
    }

    pub fn interaction_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_interaction())
            .count()
    }

    pub fn outstanding_marks(&self) -> usize {
        self.state.lock().outstanding_marks
    }

    pub fn completed_assessments(&self) -> u32 {
        self.state.lock().completed
    }

    pub fn rejected_logins(&self) -> u32 {
        self.state.lock().rejected_logins
    }

    /// Option labels clicked, keyed by (assessment, question), both 1-based
    pub fn answers(&self) -> BTreeMap<(u32, u32), Vec<String>> {
        self.state.lock().answers.clone()
    }

    pub fn current_location(&self) -> String {
        let state = self.state.lock();
        self.location_of(state.screen)
    }

    fn location_of(&self, screen: Screen) -> String {
        let base = &self.config.base_url;
        match screen {
            Screen::Blank => "about:blank".to_string(),
            Screen::Login => self.config.login_url(),
            Screen::Home | Screen::MenuOpen => format!("{base}/home.htm"),
            Screen::AssessmentList => format!("{base}/assessments.htm"),
            Screen::KeyPrompt => format!("{base}/assessments.htm#verify-key"),
            Screen::Ready => format!("{base}/assessment/ready.htm"),
            Screen::Question(n) => format!("{base}/assessment/test.htm?question={n}"),
            Screen::ConfirmEnd => format!("{base}/assessment/test.htm#confirm-end"),
        }
    }

    fn option_labels(&self, question: u32) -> Vec<String> {
        let mut labels: Vec<String> = OPTION_WORDS
            .iter()
            .enumerate()
            .map(|(index, word)| format!("Option {}: {word} {question}", index + 1))
            .collect();
        // Unlabelled placeholder the portal renders after the real options
        labels.push(format!("Option {}", OPTION_WORDS.len() + 1));
        labels
    }

    fn is_visible(&self, state: &SimState, element: Element) -> bool {
        match (state.screen, element) {
            (
                Screen::Login,
                Element::UsernameField | Element::PasswordField | Element::LoginButton,
            ) => true,
            (Screen::Home, Element::AcademicMenu) => true,
            (Screen::MenuOpen, Element::AcademicMenu | Element::OnlineAssessmentLink) => true,
            (Screen::AssessmentList, Element::StartButton) => {
                state.completed < self.config.assessments
            }
            (Screen::KeyPrompt, Element::KeyField | Element::VerifyButton) => true,
            (Screen::Ready, Element::StartAssessmentButton) => true,
            (
                Screen::Question(_),
                Element::QuestionText | Element::SaveNext | Element::EndTest,
            ) => true,
            (Screen::Question(n), Element::AnswerOptions) => {
                !self.config.broken_questions.contains(&n)
            }
            (Screen::Question(n), Element::AnswerOption(index)) => {
                !self.config.broken_questions.contains(&n)
                    && index < self.option_labels(n).len()
            }
            (Screen::ConfirmEnd, Element::ConfirmPrompt | Element::ConfirmYes) => true,
            _ => false,
        }
    }

    fn text_of(&self, state: &SimState, element: Element) -> Option<String> {
        let Screen::Question(n) = state.screen else {
            return None;
        };
        match element {
            Element::QuestionText => Some(format!(
                "Question {n} of {} Which call sign is listed for item {n}?",
                self.config.questions
            )),
            Element::AnswerOption(index) => self.option_labels(n).get(index).cloned(),
            _ => None,
        }
    }

    fn descriptor(&self, state: &SimState, element: Element) -> Descriptor {
        let id = element.id();
        let mut value = json!({
            "selector": format!("#{id}"),
            "element": id,
        });
        if let Some(text) = self.text_of(state, element) {
            value["text"] = json!(text);
        }
        Descriptor::new(value)
    }

    /// Resolve the element an instruction talks about on the current screen
    fn target_of(&self, state: &SimState, instruction: &str) -> Option<Element> {
        let lower = instruction.to_lowercase();
        if lower.contains("answer options") {
            return Some(Element::AnswerOptions);
        }
        if lower.contains("answer option") {
            let label = double_quoted(instruction)?.to_lowercase();
            let Screen::Question(n) = state.screen else {
                return None;
            };
            return self
                .option_labels(n)
                .iter()
                .position(|option| option.to_lowercase().contains(&label))
                .map(Element::AnswerOption);
        }

        let lower = strip_single_quoted(&lower);
        let keywords: [(&str, Element); 14] = [
            ("yes button", Element::ConfirmYes),
            ("confirm end", Element::ConfirmPrompt),
            ("end test", Element::EndTest),
            ("save & next", Element::SaveNext),
            ("verify", Element::VerifyButton),
            ("assessment key", Element::KeyField),
            ("start assessment", Element::StartAssessmentButton),
            ("start", Element::StartButton),
            ("question text", Element::QuestionText),
            ("username", Element::UsernameField),
            ("password", Element::PasswordField),
            ("login", Element::LoginButton),
            ("online assessment", Element::OnlineAssessmentLink),
            ("academic functions", Element::AcademicMenu),
        ];
        keywords
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, element)| *element)
    }

    fn click(&self, state: &mut SimState, element: Element) {
        match (state.screen, element) {
            (_, Element::LoginButton) => {
                if state.typed_username == self.config.username
                    && state.typed_password == self.config.password
                {
                    state.screen = Screen::Home;
                    state.login_error = None;
                } else {
                    state.rejected_logins += 1;
                    state.login_error = Some(LOGIN_ERROR.to_string());
                    debug!("simulated portal rejected credentials");
                }
            }
            (Screen::Home, Element::AcademicMenu) => state.screen = Screen::MenuOpen,
            (_, Element::OnlineAssessmentLink) => state.screen = Screen::AssessmentList,
            (_, Element::StartButton) => {
                state.typed_key.clear();
                state.screen = if self.config.assessment_key.is_some() {
                    Screen::KeyPrompt
                } else {
                    Screen::Ready
                };
            }
            (_, Element::VerifyButton) => {
                if self.config.assessment_key.as_deref() == Some(state.typed_key.as_str()) {
                    state.screen = Screen::Ready;
                }
            }
            (_, Element::StartAssessmentButton) => state.screen = Screen::Question(1),
            (Screen::Question(n), Element::AnswerOption(index)) => {
                if let Some(label) = self.option_labels(n).get(index).cloned() {
                    let assessment = state.completed + 1;
                    state.answers.entry((assessment, n)).or_default().push(label);
                }
            }
            (Screen::Question(n), Element::SaveNext) => {
                if n < self.config.questions {
                    state.screen = Screen::Question(n + 1);
                }
            }
            (_, Element::EndTest) => state.screen = Screen::ConfirmEnd,
            (_, Element::ConfirmYes) => {
                state.completed += 1;
                state.screen = Screen::AssessmentList;
            }
            _ => {}
        }
    }

    fn type_into(&self, state: &mut SimState, element: Element, value: String) -> bool {
        match element {
            Element::UsernameField => state.typed_username = value,
            Element::PasswordField => state.typed_password = value,
            Element::KeyField => state.typed_key = value,
            _ => return false,
        }
        true
    }
}

#[async_trait]
impl Actuator for PortalSimulation {
    async fn act(&self, instruction: &Instruction) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Act(instruction.to_string()));
        let text = instruction.as_str();
        let lower = text.to_lowercase();

        if lower.starts_with("navigate to ") {
            state.screen = Screen::Login;
            state.typed_username.clear();
            state.typed_password.clear();
            state.login_error = None;
            return Ok(());
        }

        if lower.starts_with("type ") {
            if self.config.direct_typing_fails {
                return Err(ActionError::ActFailed("could not type directly".to_string()));
            }
            let value = single_quoted(text)
                .ok_or_else(|| ActionError::ActFailed(format!("no quoted value in '{text}'")))?;
            let field = self
                .target_of(&state, text)
                .filter(|element| self.is_visible(&state, *element));
            if let Some(element) = field {
                if self.type_into(&mut state, element, value.to_string()) {
                    return Ok(());
                }
            }
            return Err(ActionError::ActFailed(format!("no input field for '{text}'")));
        }

        if self.config.direct_fails {
            return Err(ActionError::ActFailed(format!(
                "could not resolve '{text}' directly"
            )));
        }
        match self
            .target_of(&state, text)
            .filter(|element| self.is_visible(&state, *element))
        {
            Some(element) => {
                self.click(&mut state, element);
                Ok(())
            }
            None => Err(ActionError::ActFailed(format!("nothing matches '{text}'"))),
        }
    }

    async fn locate(&self, instruction: &Instruction) -> Result<Vec<Descriptor>, ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Locate(instruction.to_string()));
        let Some(element) = self.target_of(&state, instruction.as_str()) else {
            return Ok(Vec::new());
        };
        if !self.is_visible(&state, element) {
            return Ok(Vec::new());
        }
        if element == Element::AnswerOptions {
            let Screen::Question(n) = state.screen else {
                return Ok(Vec::new());
            };
            let count = self.option_labels(n).len();
            return Ok((0..count)
                .map(|index| self.descriptor(&state, Element::AnswerOption(index)))
                .collect());
        }
        Ok(vec![self.descriptor(&state, element)])
    }

    async fn invoke(&self, descriptor: &Descriptor) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        let id = descriptor.as_value()["element"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        state.calls.push(SimCall::Invoke(id.clone()));
        let element = Element::from_id(&id)
            .ok_or_else(|| ActionError::InvokeFailed(format!("unknown descriptor {descriptor}")))?;
        if !self.is_visible(&state, element) {
            return Err(ActionError::InvokeFailed(format!(
                "element {id} is not rendered"
            )));
        }
        self.click(&mut state, element);
        Ok(())
    }

    async fn fill(&self, descriptor: &Descriptor, text: &str) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        let id = descriptor.as_value()["element"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        state.calls.push(SimCall::Fill(id.clone()));
        let element = Element::from_id(&id)
            .filter(|element| self.is_visible(&state, *element))
            .ok_or_else(|| ActionError::InvokeFailed(format!("element {id} is not rendered")))?;
        if self.type_into(&mut state, element, text.to_string()) {
            Ok(())
        } else {
            Err(ActionError::InvokeFailed(format!("element {id} takes no input")))
        }
    }

    async fn read_location(&self) -> Result<Location, ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::ReadLocation);
        Ok(Location::new(self.location_of(state.screen)))
    }

    async fn wait_for(
        &self,
        condition: &WaitCondition,
        _timeout: Duration,
    ) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Wait);
        let location = self.location_of(state.screen);
        let holds = match condition {
            WaitCondition::DomReady => true,
            WaitCondition::Visible { instruction } => self
                .target_of(&state, instruction.as_str())
                .is_some_and(|element| self.is_visible(&state, element)),
            WaitCondition::LocationChanged { from } => location != from.as_str(),
            WaitCondition::LocationContains { marker } => location.contains(marker.as_str()),
        };
        if holds {
            Ok(())
        } else {
            Err(ActionError::WaitTimeout(format!("{condition:?} at {location}")))
        }
    }

    async fn read_text(&self, descriptor: &Descriptor) -> Result<String, ActionError> {
        let mut state = self.state.lock();
        let id = descriptor.as_value()["element"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        state.calls.push(SimCall::ReadText(id.clone()));
        Element::from_id(&id)
            .filter(|element| self.is_visible(&state, *element))
            .and_then(|element| self.text_of(&state, element))
            .ok_or_else(|| ActionError::LocateFailed(format!("no text rendered for {id}")))
    }

    async fn mark(&self, candidates: &[Descriptor]) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Mark(candidates.len()));
        state.outstanding_marks += candidates.len();
        Ok(())
    }

    async fn clear_marks(&self) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::ClearMarks);
        state.outstanding_marks = 0;
        Ok(())
    }

    async fn capture(&self, label: &str) -> Result<Option<String>, ActionError> {
        let mut state = self.state.lock();
        state.calls.push(SimCall::Capture(label.to_string()));
        if self.config.capture_fails {
            return Err(ActionError::Transport("screenshot failed".to_string()));
        }
        Ok(match state.screen {
            Screen::Login => state.login_error.clone(),
            _ => None,
        })
    }
}

fn single_quoted(text: &str) -> Option<&str> {
    let start = text.find('\'')?;
    let end = text.rfind('\'')?;
    (end > start).then(|| &text[start + 1..end])
}

fn double_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let end = text.rfind('"')?;
    (end > start).then(|| &text[start + 1..end])
}

fn strip_single_quoted(text: &str) -> String {
    match (text.find('\''), text.rfind('\'')) {
        (Some(start), Some(end)) if end > start => {
            format!("{}{}", &text[..start], &text[end + 1..])
        }
        _ => text.to_string(),
    }
}
