//! Uniform handler outcome.

use serde::{Deserialize, Serialize};

/// What the caller should do once a response has been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandlerOutcome {
    /// Nothing special required.
    #[default]
    Default,
    /// Keep the background execution slot alive; more work follows.
    ContinueBackground,
    /// Refresh dependent state (widgets, complications) now.
    RefreshNow,
}

impl HandlerOutcome {
    /// Whether this is the "nothing special" outcome.
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}
