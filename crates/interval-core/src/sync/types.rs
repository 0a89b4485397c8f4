//! Core types for companion-device synchronization.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;

/// Key-value message exchanged with the paired device.
pub type SyncPayload = serde_json::Map<String, serde_json::Value>;

/// Compact projection of session state sent to the paired device.
///
/// Field names on the wire are fixed: `isRunning`, `currentPhaseIndex`,
/// `currentIntervalIndex`, `timeRemaining`, `totalElapsedTime`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSyncSnapshot {
    pub is_running: bool,
    pub current_phase_index: usize,
    pub current_interval_index: usize,
    #[serde(rename = "timeRemaining")]
    pub time_remaining_secs: f64,
    #[serde(rename = "totalElapsedTime")]
    pub total_elapsed_secs: f64,
}

impl WorkoutSyncSnapshot {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            is_running: state.is_running,
            current_phase_index: state.current_phase_index,
            current_interval_index: state.current_interval_index,
            time_remaining_secs: state.time_remaining_secs,
            total_elapsed_secs: state.total_elapsed_secs,
        }
    }
}

/// When snapshots are pushed to the paired device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Only when a session is opened.
    OnOpen,
    /// On open, after every local intent, and every `push_every_secs` ticks.
    #[default]
    Continuous,
}
