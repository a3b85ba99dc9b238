//! Context precedence and feature union rules
//!
//! Pure functions over context identifiers and feature sets. No I/O.

use std::collections::BTreeSet;

use crate::context::ContextId;
use crate::feature::Feature;

/// Marker identifying the elevated (business) tier in a context id.
pub const DEFAULT_ELEVATED_MARKER: &str = "_business";

/// Precedence and union rules for combining several entitlement contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPolicy {
    elevated_marker: String,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ELEVATED_MARKER)
    }
}

impl ContextPolicy {
    pub fn new(elevated_marker: impl Into<String>) -> Self {
        Self {
            elevated_marker: elevated_marker.into(),
        }
    }

    pub fn elevated_marker(&self) -> &str {
        &self.elevated_marker
    }

    /// Choose the context whose branding is displayed.
    ///
    /// The first context carrying the elevated-tier marker wins regardless of
    /// its position; otherwise the first context in input order. `None` for
    /// an empty input.
    pub fn pick_theme_context<'a>(&self, contexts: &'a [ContextId]) -> Option<&'a ContextId> {
        contexts
            .iter()
            .find(|ctx| ctx.contains_marker(&self.elevated_marker))
            .or_else(|| contexts.first())
    }

    /// Union of feature sets. See [`union_features`].
    pub fn union_features<I, L>(&self, lists: I) -> Vec<Feature>
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = Feature>,
    {
        union_features(lists)
    }
}

/// Deduplicated union of all feature lists, sorted by the total order of
/// [`Feature`]. Output never depends on input or discovery order.
pub fn union_features<I, L>(lists: I) -> Vec<Feature>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = Feature>,
{
    lists
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
