//! CLI bootstrap - the composition root.
//!
//! The only place where adapters are instantiated: settings come from the
//! environment plus command-line overrides, and the HTTP clients and router
//! are built from them. Handlers receive the composed [`CliContext`].

use std::sync::Arc;

use gpurouter_core::{RouterSettings, validate_settings};
use gpurouter_runtime::{FailoverRouter, StatsCollector};
use tracing::debug;

use crate::error::CliError;

/// Command-line overrides applied on top of the environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub home_url: Option<String>,
    pub no_home: bool,
}

impl CliConfig {
    /// Apply the overrides and re-validate.
    pub fn apply(&self, mut settings: RouterSettings) -> Result<RouterSettings, CliError> {
        if self.no_home {
            settings.home_url = None;
        } else if let Some(url) = self.home_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                settings.home_url = Some(url.trim_end_matches('/').to_string());
            }
        }
        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub router: Arc<FailoverRouter>,
    pub settings: RouterSettings,
}

/// Load settings and build the router.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let settings = config.apply(RouterSettings::from_env()?)?;

    debug!(
        home_enabled = settings.home_enabled(),
        queue_enabled = settings.queue.is_some(),
        cooldown = ?settings.home_cooldown,
        "Router settings loaded"
    );

    let router = FailoverRouter::from_settings(&settings, Arc::new(StatsCollector::new()))
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(CliContext {
        router: Arc::new(router),
        settings,
    })
}
