//! Tests for event_codec module.

#[cfg(test)]
mod tests {
    use super::super::event_codec::*;
    use super::super::types::*;
    use serde_json::json;

    fn snapshot() -> WorkoutSyncSnapshot {
        WorkoutSyncSnapshot {
            is_running: true,
            current_phase_index: 2,
            current_interval_index: 1,
            time_remaining_secs: 12.5,
            total_elapsed_secs: 0.1 + 0.2,
        }
    }

    #[test]
    fn test_payload_uses_wire_keys() {
        let payload = snapshot_to_payload(&snapshot());
        let mut keys: Vec<_> = payload.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "currentIntervalIndex",
                "currentPhaseIndex",
                "isRunning",
                "timeRemaining",
                "totalElapsedTime"
            ]
        );
        assert_eq!(payload["isRunning"], json!(true));
        assert_eq!(payload["timeRemaining"], json!(12.5));
    }

    #[test]
    fn test_payload_round_trip_is_lossless() {
        let original = snapshot();
        let decoded = payload_to_snapshot(&snapshot_to_payload(&original)).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.total_elapsed_secs.to_bits(), original.total_elapsed_secs.to_bits());
    }

    #[test]
    fn test_survives_json_text_round_trip() {
        let payload = snapshot_to_payload(&snapshot());
        let text = serde_json::to_string(&payload).unwrap();
        let back: SyncPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(payload_to_snapshot(&back).unwrap().current_phase_index, 2);
    }

    #[test]
    fn test_decode_accepts_foreign_payload() {
        let payload = json!({
            "isRunning": false,
            "currentPhaseIndex": 0,
            "currentIntervalIndex": 0,
            "timeRemaining": 30,
            "totalElapsedTime": 0
        });
        let snapshot = decode_or_drop(payload.as_object().unwrap()).unwrap();
        assert_eq!(snapshot.time_remaining_secs, 30.0);
        assert!(!snapshot.is_running);
    }

    #[test]
    fn test_malformed_payloads_are_dropped() {
        let missing = json!({ "isRunning": true });
        assert!(decode_or_drop(missing.as_object().unwrap()).is_none());

        let negative = json!({
            "isRunning": true,
            "currentPhaseIndex": -1,
            "currentIntervalIndex": 0,
            "timeRemaining": 30.0,
            "totalElapsedTime": 0.0
        });
        assert!(decode_or_drop(negative.as_object().unwrap()).is_none());

        let wrong_type = json!({
            "isRunning": "yes",
            "currentPhaseIndex": 0,
            "currentIntervalIndex": 0,
            "timeRemaining": 30.0,
            "totalElapsedTime": 0.0
        });
        assert!(decode_or_drop(wrong_type.as_object().unwrap()).is_none());
    }
}
