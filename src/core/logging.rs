//! Structured logging via `tracing-subscriber`.
//!
//! Logs go to stderr so `--format json` output on stdout stays parseable.
//! `HYBRID_RAG_LOG` (an `EnvFilter` directive string) overrides the level
//! from the config file.

use crate::core::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "HYBRID_RAG_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    if let Ok(from_env) = std::env::var(LOG_ENV_VAR) {
        return EnvFilter::try_new(&from_env)
            .map_err(|e| anyhow::anyhow!("Invalid {} filter '{}': {}", LOG_ENV_VAR, from_env, e));
    }

    let mut directives = vec![level.to_string()];
    for (target, lvl) in [("sqlparser", "warn"), ("rusqlite", "warn")] {
        directives.push(format!("{}={}", target, lvl));
    }
    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = build_env_filter(&settings.level)?;
    let result = match LogFormat::parse(&settings.format) {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    };
    // Already-installed subscriber (tests, embedding callers) is fine.
    let _ = result;
    Ok(())
}
