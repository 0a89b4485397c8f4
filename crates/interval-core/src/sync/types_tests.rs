//! Tests for sync types module.

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use crate::session::SessionState;
    use crate::workout::WorkoutPlan;

    #[test]
    fn test_snapshot_projects_session_state() {
        let mut state = SessionState::new(WorkoutPlan::sample());
        state.current_phase_index = 1;
        state.current_interval_index = 1;
        state.time_remaining_secs = 7.0;
        state.total_elapsed_secs = 323.0;
        state.is_running = true;

        let snapshot = WorkoutSyncSnapshot::from_state(&state);
        assert!(snapshot.is_running);
        assert_eq!(snapshot.current_phase_index, 1);
        assert_eq!(snapshot.current_interval_index, 1);
        assert_eq!(snapshot.time_remaining_secs, 7.0);
        assert_eq!(snapshot.total_elapsed_secs, 323.0);
    }

    #[test]
    fn test_sync_mode_default_and_serialization() {
        assert_eq!(SyncMode::default(), SyncMode::Continuous);
        assert_eq!(serde_json::to_string(&SyncMode::OnOpen).unwrap(), "\"on_open\"");
        let mode: SyncMode = serde_json::from_str("\"continuous\"").unwrap();
        assert_eq!(mode, SyncMode::Continuous);
    }
}
