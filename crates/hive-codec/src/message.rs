/// The canonical set of hive message types and their wire ids.
///
/// Ids are odd values in `[32769, 33000]` so non-hive peers on the host's
/// custom-message channel ignore them. Forward-compatible additions use
/// higher ids and arrive as [`MessageKind::Unknown`] to older nodes, which
/// MUST log and drop them rather than treat them as fatal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    // Handshake: 32769–32775
    HiveHello,
    HiveChallenge,
    HiveAttest,
    HiveWelcome,
    // State: 32777–32781
    HiveGossip,
    HiveStateHash,
    HiveFullSync,
    // Intent: 32783–32787
    HiveIntent,
    HiveIntentAck,
    HiveIntentAbort,
    // Governance: 32789–32793
    HiveVouch,
    HiveBan,
    HivePromotion,
    /// Any odd id in range not recognized by this build.
    Unknown(u16),
}

impl MessageKind {
    pub fn wire_id(self) -> u16 {
        match self {
            MessageKind::HiveHello => 32_769,
            MessageKind::HiveChallenge => 32_771,
            MessageKind::HiveAttest => 32_773,
            MessageKind::HiveWelcome => 32_775,
            MessageKind::HiveGossip => 32_777,
            MessageKind::HiveStateHash => 32_779,
            MessageKind::HiveFullSync => 32_781,
            MessageKind::HiveIntent => 32_783,
            MessageKind::HiveIntentAck => 32_785,
            MessageKind::HiveIntentAbort => 32_787,
            MessageKind::HiveVouch => 32_789,
            MessageKind::HiveBan => 32_791,
            MessageKind::HivePromotion => 32_793,
            MessageKind::Unknown(id) => id,
        }
    }

    pub fn from_wire_id(id: u16) -> Self {
        match id {
            32_769 => MessageKind::HiveHello,
            32_771 => MessageKind::HiveChallenge,
            32_773 => MessageKind::HiveAttest,
            32_775 => MessageKind::HiveWelcome,
            32_777 => MessageKind::HiveGossip,
            32_779 => MessageKind::HiveStateHash,
            32_781 => MessageKind::HiveFullSync,
            32_783 => MessageKind::HiveIntent,
            32_785 => MessageKind::HiveIntentAck,
            32_787 => MessageKind::HiveIntentAbort,
            32_789 => MessageKind::HiveVouch,
            32_791 => MessageKind::HiveBan,
            32_793 => MessageKind::HivePromotion,
            other => MessageKind::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::HiveHello => "HIVE_HELLO",
            MessageKind::HiveChallenge => "HIVE_CHALLENGE",
            MessageKind::HiveAttest => "HIVE_ATTEST",
            MessageKind::HiveWelcome => "HIVE_WELCOME",
            MessageKind::HiveGossip => "HIVE_GOSSIP",
            MessageKind::HiveStateHash => "HIVE_STATE_HASH",
            MessageKind::HiveFullSync => "HIVE_FULL_SYNC",
            MessageKind::HiveIntent => "HIVE_INTENT",
            MessageKind::HiveIntentAck => "HIVE_INTENT_ACK",
            MessageKind::HiveIntentAbort => "HIVE_INTENT_ABORT",
            MessageKind::HiveVouch => "HIVE_VOUCH",
            MessageKind::HiveBan => "HIVE_BAN",
            MessageKind::HivePromotion => "HIVE_PROMOTION",
            MessageKind::Unknown(_) => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_roundtrip() {
        for kind in [
            MessageKind::HiveHello,
            MessageKind::HiveChallenge,
            MessageKind::HiveAttest,
            MessageKind::HiveWelcome,
            MessageKind::HiveGossip,
            MessageKind::HiveStateHash,
            MessageKind::HiveFullSync,
            MessageKind::HiveIntent,
            MessageKind::HiveIntentAck,
            MessageKind::HiveIntentAbort,
            MessageKind::HiveVouch,
            MessageKind::HiveBan,
            MessageKind::HivePromotion,
        ] {
            assert_eq!(MessageKind::from_wire_id(kind.wire_id()), kind);
        }
    }

    #[test]
    fn unrecognized_id_is_unknown() {
        assert!(matches!(
            MessageKind::from_wire_id(32_999),
            MessageKind::Unknown(32_999)
        ));
    }
}
