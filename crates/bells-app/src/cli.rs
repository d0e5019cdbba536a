//! CLI argument definitions for the Bells assistant.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Bells: a campus information assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "bells", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Simulated response delay in milliseconds.
    #[arg(short = 'd', long = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Ask a single question, print the answer and exit.
    #[arg(long = "once", value_name = "QUESTION")]
    pub once: Option<String>,

    /// Print assistant responses as JSON documents.
    #[arg(long = "json")]
    pub json: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BELLS_CONFIG env var > platform default (~/.bells/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("BELLS_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the simulated response delay.
    ///
    /// Priority: --delay-ms flag > BELLS_DELAY_MS env var > config file value.
    pub fn resolve_delay_ms(&self, config_delay_ms: u64) -> u64 {
        if let Some(ms) = self.delay_ms {
            return ms;
        }
        if let Ok(val) = std::env::var("BELLS_DELAY_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                return ms;
            }
        }
        config_delay_ms
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".bells").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".bells").join("config.toml");
    }
    PathBuf::from("config.toml")
}
