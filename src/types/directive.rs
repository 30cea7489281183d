//! Host-facing directives emitted by running actions

use serde::{Deserialize, Serialize};

/// A single presentation-layer instruction. The engine never renders or
/// plays anything itself; it appends directives to a per-tick buffer that
/// the host drains and interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args")]
#[non_exhaustive]
pub enum Directive {
    /// Display spoken dialogue
    Say { speaker: String, text: String },
    /// Play a one-shot sound effect
    PlaySound { name: String },
    /// Start looping background music
    PlayMusic { name: String },
    /// Persist the game now (deferred until gameplay is unblocked)
    Autosave,
    /// Present the options of the named conversation
    BeginOptions { conversation: String },
}
