use clap::Subcommand;

use super::cache::CacheArgs;
use super::config::ConfigArgs;
use super::demo::DemoArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run a full session against the driver and the oracle
    Run(RunArgs),

    /// Run a full session against the built-in simulated portal
    Demo(DemoArgs),

    /// Inspect or maintain the action cache file
    Cache(CacheArgs),

    /// Show or validate configuration
    Config(ConfigArgs),
}
