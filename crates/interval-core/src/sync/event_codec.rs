//! Encoding/decoding between snapshots and transport payloads.

use serde_json::Value;
use tracing::debug;

use crate::sync::types::{SyncPayload, WorkoutSyncSnapshot};

/// Convert a snapshot to the key-value map handed to the transport.
pub fn snapshot_to_payload(snapshot: &WorkoutSyncSnapshot) -> SyncPayload {
    match serde_json::to_value(snapshot) {
        Ok(Value::Object(map)) => map,
        _ => SyncPayload::new(),
    }
}

/// Decode a payload received from the transport.
pub fn payload_to_snapshot(payload: &SyncPayload) -> Result<WorkoutSyncSnapshot, serde_json::Error> {
    serde_json::from_value(Value::Object(payload.clone()))
}

/// Decode a payload, dropping anything malformed.
pub fn decode_or_drop(payload: &SyncPayload) -> Option<WorkoutSyncSnapshot> {
    match payload_to_snapshot(payload) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            debug!(error = %e, keys = ?payload.keys().collect::<Vec<_>>(), "dropping malformed sync payload");
            None
        }
    }
}
