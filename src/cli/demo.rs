use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use answer_engine::MockOracle;
use assess_pilot::config::TimingConfig;
use assess_pilot::{PortalSimulation, SessionSettings, SimulationConfig};
use clap::{ArgAction, Args};
use tracing::info;

use super::context::CliContext;
use super::session::{execute, print_report, write_metrics};

const DEMO_KEY: &str = "DEMO-KEY";

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Questions per assessment
    #[arg(long, default_value_t = 10)]
    pub questions: u32,

    /// Assessments offered by the simulated portal
    #[arg(long, default_value_t = 1)]
    pub assessments: u32,

    /// Reject every direct click so actions use locate-and-invoke
    #[arg(long)]
    pub direct_fails: bool,

    /// Reject direct typing so credentials and keys are filled into located fields
    #[arg(long)]
    pub direct_typing_fails: bool,

    /// Render this question without answer options (repeatable)
    #[arg(long = "fail-question", value_name = "N", action = ArgAction::Append)]
    pub fail_questions: Vec<u32>,

    /// Show the assessment key prompt before each assessment
    #[arg(long)]
    pub require_key: bool,

    /// Write the Prometheus text exposition here after the run
    #[arg(long, value_name = "FILE")]
    pub metrics_out: Option<PathBuf>,
}

pub async fn cmd_demo(args: DemoArgs, ctx: &CliContext) -> Result<()> {
    let simulation = SimulationConfig {
        assessments: args.assessments,
        questions: args.questions,
        direct_fails: args.direct_fails,
        direct_typing_fails: args.direct_typing_fails,
        broken_questions: args.fail_questions.iter().copied().collect::<BTreeSet<_>>(),
        assessment_key: args.require_key.then(|| DEMO_KEY.to_string()),
        ..SimulationConfig::default()
    };

    let mut config = ctx.config().clone();
    simulation.apply_to(&mut config);
    config.timing = TimingConfig::immediate();
    config.retry.base_delay_ms = 0;
    config.validate()?;

    info!(
        assessments = simulation.assessments,
        questions = simulation.questions,
        direct_fails = simulation.direct_fails,
        direct_typing_fails = simulation.direct_typing_fails,
        broken = ?simulation.broken_questions,
        "running against the simulated portal"
    );
    let portal = Arc::new(PortalSimulation::new(simulation));
    let settings = SessionSettings::from_config(&config).without_cache_file();
    let outcome = execute(
        &config,
        portal.clone(),
        Arc::new(MockOracle::default()),
        settings,
    )
    .await;
    info!(
        interactions = portal.interaction_count(),
        outstanding_marks = portal.outstanding_marks(),
        "simulated portal finished"
    );
    write_metrics(args.metrics_out.as_deref()).await?;
    print_report(&outcome?)
}
