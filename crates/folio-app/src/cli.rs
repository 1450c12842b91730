//! CLI argument definitions for the Folio relay.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use folio_core::FolioConfig;
use std::path::PathBuf;

/// Folio: chat relay between a portfolio site, an LLM, and the owner's inbox.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FOLIO_CONFIG env var > ~/.folio/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FOLIO_CONFIG") {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        default_config_path()
    }

    /// Log level: --log-level flag, else the configured level.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Apply flag overrides on top of file and environment values.
    pub fn apply_to(&self, config: &mut FolioConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".folio").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".folio").join("config.toml");
    }
    PathBuf::from("config.toml")
}
