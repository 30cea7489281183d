//! Storage module for saving and loading engine snapshots
//!
//! Snapshots cover the shared variable store and the engine clock, encoded
//! as JSON. Mid-flight cutscene state is deliberately not serialized.

use serde::{Deserialize, Serialize};

use crate::types::value::VarStore;

/// Point-in-time capture of the persistent engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub vars: VarStore,
    pub clock: f64,
}

/// Serialize a snapshot to bytes
pub fn save(snapshot: &Snapshot) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_string_pretty(snapshot)?;
    Ok(json.into_bytes())
}

/// Deserialize a snapshot from bytes
pub fn load(bytes: &[u8]) -> anyhow::Result<Snapshot> {
    let json = String::from_utf8(bytes.to_vec())?;
    let snapshot = serde_json::from_str(&json)?;
    Ok(snapshot)
}
