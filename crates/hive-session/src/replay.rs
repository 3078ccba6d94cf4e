use hive_core::{HiveError, Sequence, Timestamp, REPLAY_WINDOW_SECS};

/// Rejects a frame whose timestamp has drifted outside the replay window or
/// whose sequence number does not strictly advance past what this sender has
/// already produced (spec §4.4, §7 `ProtocolError`).
pub fn check_replay(
    now: Timestamp,
    frame_ts: Timestamp,
    sequence: Sequence,
    last_seen_sequence: Sequence,
) -> Result<(), HiveError> {
    if (now - frame_ts).abs() > REPLAY_WINDOW_SECS {
        return Err(HiveError::TimestampOutOfWindow { now, frame_ts });
    }
    if sequence <= last_seen_sequence {
        return Err(HiveError::SequenceRegression {
            last_seen: last_seen_sequence,
            got: sequence,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fresh_increasing_sequence() {
        assert!(check_replay(1_000, 990, 5, 4).is_ok());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let err = check_replay(1_000, 600, 5, 4).unwrap_err();
        assert!(matches!(err, HiveError::TimestampOutOfWindow { .. }));
    }

    #[test]
    fn rejects_non_increasing_sequence() {
        let err = check_replay(1_000, 999, 4, 4).unwrap_err();
        assert!(matches!(err, HiveError::SequenceRegression { .. }));
    }
}
