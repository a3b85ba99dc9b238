//! Show command implementation

use std::sync::Arc;

use super::{Settings, print_state};
use crate::error::Result;
use crate::template::TemplateProvider;

/// Print the state a cold start would publish.
pub fn run_show(settings: &Settings, json: bool) -> Result<()> {
    let engine = settings.engine(Arc::new(TemplateProvider::default()));
    let state = engine.current_state();
    print_state(&state, engine.store().path(), json)
}
