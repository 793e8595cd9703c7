use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use answer_engine::OpenAiOracle;
use assess_pilot::{HttpActuator, PilotConfig, SessionSettings};
use clap::Args;
use tracing::info;

use super::context::CliContext;
use super::session::{execute, print_report, write_metrics};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Questions per assessment (overrides the configuration)
    #[arg(long)]
    pub questions: Option<u32>,

    /// Validate configuration and print the plan without contacting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write the Prometheus text exposition here after the run
    #[arg(long, value_name = "FILE")]
    pub metrics_out: Option<PathBuf>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    if let Some(questions) = args.questions {
        config.assessment.question_count = questions;
    }
    config.validate()?;

    if args.dry_run {
        print_plan(&config);
        return Ok(());
    }

    let actuator = HttpActuator::new(&config.driver).context("Failed to create driver client")?;
    let oracle = OpenAiOracle::new(config.openai_config())
        .context("Oracle is not configured (set oracle.api_keys or PILOT_ORACLE_API_KEY)")?;
    info!(driver = %actuator.endpoint(), model = %config.oracle.model, "starting session");

    let settings = SessionSettings::from_config(&config);
    let outcome = execute(&config, Arc::new(actuator), Arc::new(oracle), settings).await;
    write_metrics(args.metrics_out.as_deref()).await?;
    print_report(&outcome?)
}

fn print_plan(config: &PilotConfig) {
    println!("Dry run: nothing will be contacted");
    println!("  login:       {}", config.portal.login_url);
    for (index, step) in config.portal.navigation.iter().enumerate() {
        println!("  navigate {}:  {}", index + 1, step);
    }
    println!(
        "  questions:   {} per assessment (abort after {} consecutive failures)",
        config.assessment.question_count, config.assessment.max_consecutive_failures
    );
    match config.assessment.max_assessments {
        Some(limit) => println!("  assessments: at most {limit}"),
        None => println!("  assessments: until none are left"),
    }
    println!(
        "  key:         {}",
        if config.assessment.key.is_some() { "configured" } else { "not configured" }
    );
    println!("  cache:       {} (ttl {}s)", config.cache.path.display(), config.cache.ttl_secs);
    println!("  driver:      {}", config.driver.endpoint);
    println!(
        "  oracle:      {} at {} ({} key(s))",
        config.oracle.model,
        config.oracle.api_base,
        config.oracle.api_keys.len()
    );
}
