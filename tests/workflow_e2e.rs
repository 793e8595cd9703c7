//! End-to-end sessions against the in-process portal

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use action_cache::ActionCache;
use action_flow::ResilientExecutor;
use answer_engine::{AnswerResolver, MockOracle};
use assess_pilot::config::TimingConfig;
use assess_pilot::{
    AssessmentSession, PilotConfig, PortalSimulation, SessionSettings, SimCall,
    SimulationConfig, WorkflowError, WorkflowState,
};
use tokio_test::{assert_err, assert_ok};

struct Harness {
    portal: Arc<PortalSimulation>,
    cache: Arc<ActionCache>,
    session: AssessmentSession,
}

fn pilot_config(sim: &SimulationConfig) -> PilotConfig {
    let mut config = PilotConfig::default();
    sim.apply_to(&mut config);
    config.timing = TimingConfig::immediate();
    config.retry.base_delay_ms = 0;
    config
}

fn harness_with(sim: SimulationConfig, config: PilotConfig, cache_file: Option<&Path>) -> Harness {
    let portal = Arc::new(PortalSimulation::new(sim));
    let cache = Arc::new(ActionCache::with_ttl(config.cache_ttl()));
    let executor = ResilientExecutor::new(portal.clone(), cache.clone(), config.executor_config());
    let resolver = AnswerResolver::new(Arc::new(MockOracle::default())).with_matcher(config.matcher());

    let mut settings = SessionSettings::from_config(&config);
    settings.cache_path = cache_file.map(Path::to_path_buf);
    Harness {
        portal,
        cache,
        session: AssessmentSession::new(executor, resolver, settings),
    }
}

fn harness(sim: SimulationConfig) -> Harness {
    let config = pilot_config(&sim);
    harness_with(sim, config, None)
}

#[tokio::test]
async fn single_assessment_through_fallback_caches_structural_clicks() {
    let mut h = harness(SimulationConfig {
        direct_fails: true,
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.final_state, WorkflowState::Done);
    assert_eq!(report.assessments_completed, 1);
    assert_eq!(report.questions_answered, 10);
    assert_eq!(report.questions_failed, 0);

    // login, two menu steps, Start and Start Assessment
    let stats = h.cache.stats();
    assert_eq!(stats.stores, 5);
    assert_eq!(h.cache.len(), 5);
    assert_eq!(stats.hits, 0);

    assert_eq!(h.portal.outstanding_marks(), 0);
    assert_eq!(h.portal.completed_assessments(), 1);
    let answers = h.portal.answers();
    for n in 1..=10 {
        assert_eq!(answers[&(1, n)], vec![format!("Option 1: Alpha {n}")]);
    }
}

#[tokio::test]
async fn second_assessment_reuses_cached_descriptors() {
    let mut h = harness(SimulationConfig {
        assessments: 2,
        assessment_key: Some("K1".to_string()),
        direct_fails: true,
        questions: 3,
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.assessments_completed, 2);
    assert_eq!(report.questions_answered, 6);
    assert_eq!(h.portal.completed_assessments(), 2);

    // Verify joins the five structural clicks; the second pass hits
    // Start, Verify and Start Assessment
    let stats = h.cache.stats();
    assert_eq!(stats.stores, 6);
    assert_eq!(h.cache.len(), 6);
    assert_eq!(stats.hits, 3);
}

#[tokio::test]
async fn direct_clicks_leave_the_cache_empty() {
    let mut h = harness(SimulationConfig {
        questions: 2,
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.final_state, WorkflowState::Done);
    assert_eq!(report.questions_answered, 2);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn rejected_login_fails_the_session() {
    let sim = SimulationConfig::default();
    let mut config = pilot_config(&sim);
    config.credentials.password = "not-the-password".to_string();
    let mut h = harness_with(sim, config, None);

    let err = assert_err!(h.session.run().await);
    let WorkflowError::Structural { step, reason } = err else {
        panic!("expected a structural failure");
    };
    assert_eq!(step, WorkflowState::Authenticating);
    assert!(reason.contains("after submitting credentials"));
    assert!(reason.contains("Invalid username or password"));
    assert!(!reason.contains("not-the-password"));
    assert_eq!(h.session.state(), WorkflowState::Failed);
    assert_eq!(h.portal.rejected_logins(), 1);
    assert!(h
        .portal
        .calls()
        .contains(&SimCall::Capture("authenticating".to_string())));
}

#[tokio::test]
async fn failed_capture_leaves_the_login_error_unchanged() {
    let sim = SimulationConfig {
        capture_fails: true,
        ..SimulationConfig::default()
    };
    let mut config = pilot_config(&sim);
    config.credentials.password = "not-the-password".to_string();
    let mut h = harness_with(sim, config, None);

    let err = assert_err!(h.session.run().await);
    let WorkflowError::Structural { step, reason } = err else {
        panic!("expected a structural failure");
    };
    assert_eq!(step, WorkflowState::Authenticating);
    assert!(reason.ends_with("after submitting credentials"));
    assert_eq!(h.session.state(), WorkflowState::Failed);
}

#[tokio::test]
async fn credentials_and_key_are_filled_when_direct_typing_fails() {
    let mut h = harness(SimulationConfig {
        assessment_key: Some("K1".to_string()),
        direct_fails: true,
        direct_typing_fails: true,
        questions: 2,
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.final_state, WorkflowState::Done);
    assert_eq!(report.questions_answered, 2);
    assert_eq!(h.portal.rejected_logins(), 0);

    let calls = h.portal.calls();
    for field in ["username", "password", "assessment-key"] {
        assert!(calls.contains(&SimCall::Fill(field.to_string())), "{field} was not filled");
    }
    // typed values are never cached
    assert_eq!(h.cache.len(), 6);
    assert_eq!(h.portal.outstanding_marks(), 0);
}

#[tokio::test]
async fn unmoved_navigation_fails_with_a_capture() {
    let sim = SimulationConfig::default();
    let mut config = pilot_config(&sim);
    config.portal.navigation.clear();
    let mut h = harness_with(sim, config, None);

    let err = assert_err!(h.session.run().await);
    let WorkflowError::Structural { step, reason } = err else {
        panic!("expected a structural failure");
    };
    assert_eq!(step, WorkflowState::Navigating);
    assert!(reason.contains("still on the landing page"));
    assert!(!reason.contains("portal shows"));
    assert!(h
        .portal
        .calls()
        .contains(&SimCall::Capture("navigating".to_string())));
}

#[tokio::test]
async fn missing_key_configuration_fails_key_verification() {
    let sim = SimulationConfig {
        assessment_key: Some("K1".to_string()),
        ..SimulationConfig::default()
    };
    let mut config = pilot_config(&sim);
    config.assessment.key = None;
    let mut h = harness_with(sim, config, None);

    let err = assert_err!(h.session.run().await);
    assert_eq!(err.step(), Some(WorkflowState::KeyVerification));
    assert_eq!(h.session.report().final_state, WorkflowState::Failed);
}

#[tokio::test]
async fn three_consecutive_failures_abort() {
    let mut h = harness(SimulationConfig {
        broken_questions: BTreeSet::from([3, 4, 5]),
        ..SimulationConfig::default()
    });

    let err = assert_err!(h.session.run().await);
    assert!(matches!(
        err,
        WorkflowError::TooManyFailures {
            consecutive: 3,
            last_question: 5
        }
    ));
    let state = h.session.session_state();
    assert_eq!(state.questions_answered, 2);
    assert_eq!(state.questions_failed, 3);
    assert_eq!(state.state, WorkflowState::Failed);
}

#[tokio::test]
async fn isolated_failures_are_tolerated() {
    let mut h = harness(SimulationConfig {
        direct_fails: true,
        broken_questions: BTreeSet::from([2, 3, 5, 6, 8, 9]),
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.final_state, WorkflowState::Done);
    assert_eq!(report.questions_answered, 4);
    assert_eq!(report.questions_failed, 6);
    let answered: Vec<u32> = h.portal.answers().keys().map(|(_, q)| *q).collect();
    assert_eq!(answered, vec![1, 4, 7, 10]);
}

#[tokio::test]
async fn cache_file_carries_descriptors_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("action-cache.json");
    let sim = SimulationConfig {
        direct_fails: true,
        questions: 2,
        ..SimulationConfig::default()
    };

    let mut first = harness_with(sim.clone(), pilot_config(&sim), Some(&path));
    first.session.run().await.unwrap();
    assert_eq!(first.cache.stats().stores, 5);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains(&sim.password));
    assert!(!contents.contains("Navigate to"));

    let mut second = harness_with(sim.clone(), pilot_config(&sim), Some(&path));
    let report = second.session.run().await.unwrap();
    assert_eq!(report.final_state, WorkflowState::Done);
    let stats = second.cache.stats();
    assert_eq!(stats.hits, 5);
    assert_eq!(stats.stores, 0);
}

#[tokio::test]
async fn no_assessments_finishes_immediately() {
    let mut h = harness(SimulationConfig {
        assessments: 0,
        ..SimulationConfig::default()
    });

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.final_state, WorkflowState::Done);
    assert_eq!(report.assessments_completed, 0);
    assert_eq!(report.questions_answered, 0);
    assert!(h.portal.current_location().ends_with("assessments.htm"));
}

#[tokio::test]
async fn assessment_limit_stops_early() {
    let sim = SimulationConfig {
        assessments: 3,
        questions: 1,
        ..SimulationConfig::default()
    };
    let mut config = pilot_config(&sim);
    config.assessment.max_assessments = Some(1);
    let mut h = harness_with(sim, config, None);

    let report = assert_ok!(h.session.run().await);
    assert_eq!(report.assessments_completed, 1);
    assert_eq!(h.portal.completed_assessments(), 1);
}
