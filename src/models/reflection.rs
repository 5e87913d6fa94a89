use serde::{Deserialize, Serialize};

/// Structured reflection returned by the external AI collaborator.
///
/// Field names follow the response schema the service is asked for, so the
/// body parses straight into this struct. A reflection is ephemeral: computed
/// on demand from the feed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reflection {
    /// High-level synthesis of what is on the author's mind.
    pub summary: String,
    /// Recurring motifs found across the thoughts.
    pub themes: Vec<String>,
    /// Overall emotional landscape, e.g. "Restless" or "Inspired".
    pub sentiment: String,
    /// A short quote generated for this state of mind.
    #[serde(rename = "zenQuote")]
    pub zen_quote: String,
}
