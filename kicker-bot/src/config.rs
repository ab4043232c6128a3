use std::{env, path::PathBuf};

use anyhow::Context as _;

use kicker_core::RunMode;

const DEFAULT_LOG_DIR: &str = "logs";

/// Settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub mode: RunMode,
    pub log_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
        let mode = run_mode(env::var("SIMULATE").ok().as_deref());
        let log_dir = env::var("KICKER_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR));

        Ok(Self {
            token,
            mode,
            log_dir,
        })
    }
}

/// Sessions are simulated unless `SIMULATE` is set to something other than `true`.
fn run_mode(raw: Option<&str>) -> RunMode {
    match raw {
        Some(value) if !value.trim().eq_ignore_ascii_case("true") => RunMode::Live,
        _ => RunMode::Simulated,
    }
}
