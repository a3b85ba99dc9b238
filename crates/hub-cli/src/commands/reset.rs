//! Reset command implementation

use std::sync::Arc;

use colored::Colorize;

use super::Settings;
use crate::error::Result;
use crate::template::TemplateProvider;

/// Erase the cached configuration.
pub fn run_reset(settings: &Settings) -> Result<()> {
    let engine = settings.engine(Arc::new(TemplateProvider::default()));
    let path = engine.store().path().display().to_string();

    if engine.reset_cache() {
        println!("{} Removed cached config at {}", "-".red(), path);
    } else {
        println!("{} No cached config at {}", "=".dimmed(), path);
    }
    Ok(())
}
