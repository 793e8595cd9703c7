use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assess_pilot::PilotConfig;
use tokio::fs;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOCAL_ENV_FILE: &str = "config/local.env";
const LOG_FILE_PREFIX: &str = "assess-pilot.log";

/// Export `KEY=value` lines from `config/local.env`; variables already set win
pub fn load_local_env_overrides() -> usize {
    apply_env_file(Path::new(LOCAL_ENV_FILE))
}

fn apply_env_file(path: &Path) -> usize {
    let contents = match stdfs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(err) => {
            warn!(path = %path.display(), %err, "unreadable env file ignored");
            return 0;
        }
    };

    let mut applied = 0;
    for (number, entry) in contents.lines().map(str::trim).enumerate() {
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let Some((key, value)) = entry.split_once('=') else {
            warn!(path = %path.display(), line = number + 1, "expected KEY=value");
            continue;
        };
        let key = key.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }
        env::set_var(key, unescape_value(value.trim()));
        applied += 1;
    }
    info!(path = %path.display(), applied, "environment overrides loaded");
    applied
}

/// Install the subscriber; the returned guard flushes the log file on drop
pub fn init_logging(level: &str, debug: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            stdfs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

pub struct LoadedConfig {
    pub config: PilotConfig,
    pub path: PathBuf,
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            // Priority: ./config/pilot.yaml > ~/.config/assess-pilot/pilot.yaml
            let local_config = PathBuf::from("config/pilot.yaml");
            if local_config.exists() {
                local_config
            } else {
                let mut path = dirs::config_dir().context("Failed to get config directory")?;
                path.push("assess-pilot");
                path.push("pilot.yaml");
                path
            }
        }
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let config: PilotConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        PilotConfig::default()
    };
    config.apply_env_overrides();

    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_values_are_unescaped() {
        assert_eq!(unescape_value("\"a \\\"b\\\"\""), "a \"b\"");
        assert_eq!(unescape_value("plain"), "plain");
        assert_eq!(unescape_value("\""), "\"");
    }

    #[test]
    #[serial_test::serial]
    fn env_file_never_overrides_existing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.env");
        std::fs::write(
            &path,
            "# comment\nPILOT_TEST_FRESH=\"quoted value\"\nPILOT_TEST_TAKEN=file\nbroken line\n",
        )
        .unwrap();
        env::set_var("PILOT_TEST_TAKEN", "shell");
        env::remove_var("PILOT_TEST_FRESH");

        assert_eq!(apply_env_file(&path), 1);
        assert_eq!(env::var("PILOT_TEST_FRESH").unwrap(), "quoted value");
        assert_eq!(env::var("PILOT_TEST_TAKEN").unwrap(), "shell");
        assert_eq!(apply_env_file(&dir.path().join("missing.env")), 0);

        env::remove_var("PILOT_TEST_FRESH");
        env::remove_var("PILOT_TEST_TAKEN");
    }

    #[tokio::test]
    async fn explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilot.yaml");
        std::fs::write(&path, "assessment:\n  question_count: 4\n").unwrap();
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.assessment.question_count, 4);
        assert_eq!(loaded.path, path);
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.assessment.question_count, 10);
    }
}
