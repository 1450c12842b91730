//! Folio application binary - composition root.
//!
//! 1. Load `.env`, the TOML configuration, and environment overrides
//! 2. Build the Groq completion client and the admin email sender
//! 3. Log startup diagnostics and probe the completion API once
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;
use folio_api::routes;
use folio_api::state::AppState;
use folio_chat::{CompletionClient, ModelConfig, ModelControl};
use folio_core::FolioConfig;
use folio_remote::{sender_from_config, GroqClient};

use crate::cli::CliArgs;

/// Log the effective setup and check the completion API once.
///
/// Failures are reported, never fatal: the server still starts.
async fn startup_diagnostics(config: &FolioConfig, models: &ModelControl) {
    let active = ModelConfig::from_config(&config.completion);
    tracing::info!(
        model = %active.model,
        admin_email = %config.email.admin_email,
        api_key_present = models.is_ready(),
        email_api_key_present = !config.email.api_key.trim().is_empty(),
        "Relay configuration"
    );

    if !models.is_ready() {
        tracing::warn!("GROQ_API_KEY not set; chat requests will fail until it is configured");
        return;
    }

    match models.probe(&active).await {
        Ok(reply) => tracing::info!(reply = %reply, "Completion API reachable"),
        Err(e) => tracing::error!(category = e.code(), error = %e, "Completion API probe failed"),
    }

    let available = models.available_models().await;
    tracing::info!(count = available.len(), models = ?available, "Available models");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let dotenv = dotenvy::dotenv();

    // Config file, read before logging so its level can seed the filter.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match FolioConfig::load(&config_file) {
            Ok(c) => (c, None),
            Err(e) => (FolioConfig::default(), Some(e)),
        }
    } else {
        (FolioConfig::default(), None)
    };

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Folio v{}", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => tracing::debug!(".env not found"),
        Err(e) => tracing::warn!(error = %e, "Failed to read .env"),
    }
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
    }

    config.apply_env_overrides();
    args.apply_to(&mut config);
    config.validate()?;

    // Collaborators.
    let completion: Arc<dyn CompletionClient> = Arc::new(GroqClient::new(&config.completion)?);
    let email = sender_from_config(&config.email)?;

    let models = ModelControl::new(completion.clone());
    startup_diagnostics(&config, &models).await;

    let state = AppState::new(config, completion, email);
    routes::start_server(state).await?;

    Ok(())
}
