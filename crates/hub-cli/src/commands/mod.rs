//! Command implementations for hub-cli

pub mod lint;
pub mod reset;
pub mod resolve;
pub mod show;

pub use lint::run_lint;
pub use reset::run_reset;
pub use resolve::run_resolve;
pub use show::run_show;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use hub_core::{
    EngineConfig, ResolutionEngine, ResolutionState, SnapshotProvider, StateOrigin,
    TracingTelemetry,
};

use crate::error::Result;

/// Settings shared by every command, taken from the global flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: EngineConfig,
}

impl Settings {
    /// Load the engine configuration and apply the `--cache` override.
    pub fn load(config_path: Option<&Path>, cache: Option<PathBuf>) -> Result<Self> {
        let mut config = EngineConfig::load_or_default(config_path)?;
        if let Some(cache) = cache {
            config.cache.path = Some(cache);
        }
        Ok(Self { config })
    }

    pub fn engine(&self, provider: Arc<dyn SnapshotProvider>) -> ResolutionEngine {
        ResolutionEngine::from_config(&self.config, provider, Arc::new(TracingTelemetry))
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Print a resolution state, as JSON or for humans.
pub(crate) fn print_state(state: &ResolutionState, cache_path: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    let origin = match state.origin {
        StateOrigin::Defaults => "built-in defaults".yellow(),
        StateOrigin::Cache => "cache".cyan(),
        StateOrigin::Remote => "remote".green(),
    };
    println!("{} ({})", "Effective Configuration".bold(), origin);
    println!();

    let config = &state.config;
    println!("{}:  {}", "Display name".dimmed(), config.display_name);
    println!("{}:   {}", "Theme color".dimmed(), config.theme_color);
    println!("{}:    {}", "Data limit".dimmed(), config.data_limit);
    println!(
        "{}:      {}",
        "Priority".dimmed(),
        yes_no(config.has_priority_support)
    );
    let version = if state.meta_version.is_empty() {
        "-".dimmed().to_string()
    } else {
        state.meta_version.clone()
    };
    println!("{}:       {}", "Version".dimmed(), version);
    println!("{}:         {}", "Cache".dimmed(), cache_path.display());
    println!();

    if state.limited_mode {
        println!("{}", "Limited mode: kill-switch active".red().bold());
        println!();
    }

    println!("{}:", "Features".bold());
    if state.features.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        for feature in &state.features {
            println!("  {} {} ({})", "+".green(), feature.short_name().cyan(), feature);
        }
    }
    println!();

    let freshness = if state.is_stale {
        "stale".red()
    } else {
        "fresh".green()
    };
    println!(
        "{}: {} ({}s of {}s remaining)",
        "Freshness".bold(),
        freshness,
        state.ttl_seconds_remaining,
        state.ttl_seconds
    );

    Ok(())
}
