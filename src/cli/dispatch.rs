use super::cache::cmd_cache;
use super::config::cmd_config;
use super::demo::cmd_demo;
use super::env::CliArgs;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Demo(args) => cmd_demo(args, ctx).await,
        Commands::Cache(args) => cmd_cache(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
