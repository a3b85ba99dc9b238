//! Resolve command implementation

use std::path::Path;
use std::sync::Arc;

use hub_core::{ContextId, ResolveOutcome};

use super::{Settings, print_state};
use crate::error::{CliError, Result};
use crate::template::TemplateProvider;

/// Resolve `contexts` against the template and print the published state.
pub async fn run_resolve(
    settings: &Settings,
    template: &Path,
    contexts: &[String],
    json: bool,
) -> Result<()> {
    let provider = TemplateProvider::load(template)?;
    for id in contexts {
        if !provider.context_ids().any(|known| known == id) {
            tracing::warn!(context = %id, "Context not in template; it will use defaults");
        }
    }
    let engine = settings.engine(Arc::new(provider));

    let ids: Vec<ContextId> = contexts.iter().map(ContextId::new).collect();
    match engine.resolve(&ids).await {
        ResolveOutcome::Published(state) => print_state(&state, engine.store().path(), json),
        ResolveOutcome::Ignored => Err(CliError::user("No contexts given")),
        ResolveOutcome::Superseded => Err(CliError::user("Resolution was superseded")),
    }
}
