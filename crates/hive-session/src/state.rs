use hive_core::{NodePubkey, Sequence, Timestamp, HANDSHAKE_STEP_TIMEOUT_SECS};

/// Per-peer session state machine (spec §4.4):
///
/// ```text
/// NEW -HELLO-> AWAIT_CHALLENGE -CHALLENGE-> AWAIT_ATTEST -ATTEST+verify-> ACTIVE
///                                                         \-(fail)-> REJECTED
/// ACTIVE -disconnect-> DORMANT (session cached)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    New,
    AwaitChallenge,
    AwaitAttest,
    Active,
    Rejected,
    Dormant,
}

/// Sliding window error counter: disconnect a peer once it crosses
/// `PEER_ERROR_DISCONNECT_THRESHOLD` protocol errors inside
/// `PEER_ERROR_WINDOW_SECS` (§7).
#[derive(Clone, Copy, Debug, Default)]
pub struct PeerErrorWindow {
    window_start_ts: Timestamp,
    count: u32,
}

impl PeerErrorWindow {
    /// Records one protocol error and returns `true` if the peer has now
    /// crossed the disconnect threshold.
    pub fn record_error(&mut self, now: Timestamp, window_secs: i64, threshold: u32) -> bool {
        if now - self.window_start_ts > window_secs {
            self.window_start_ts = now;
            self.count = 0;
        }
        self.count += 1;
        self.count >= threshold
    }
}

/// One connected peer's handshake and liveness state. Owned by the
/// connection task that drives frames to/from this peer.
pub struct PeerSession {
    pub pubkey: Option<NodePubkey>,
    pub state: SessionState,
    pub last_seen_ts: Timestamp,
    pub last_sequence: Sequence,
    pub challenge_nonce: Option<[u8; 32]>,
    /// Deadline for the current handshake step; `None` once ACTIVE/REJECTED/DORMANT.
    pub step_deadline_ts: Option<Timestamp>,
    pub errors: PeerErrorWindow,
}

impl PeerSession {
    pub fn new(now: Timestamp) -> Self {
        Self {
            pubkey: None,
            state: SessionState::New,
            last_seen_ts: now,
            last_sequence: 0,
            challenge_nonce: None,
            step_deadline_ts: Some(now + HANDSHAKE_STEP_TIMEOUT_SECS as Timestamp),
            errors: PeerErrorWindow::default(),
        }
    }

    pub fn arm_step_deadline(&mut self, now: Timestamp) {
        self.step_deadline_ts = Some(now + HANDSHAKE_STEP_TIMEOUT_SECS as Timestamp);
    }

    /// Transient I/O failure during handshake: return to NEW with the caller
    /// applying its own exponential back-off before the retry (§5).
    pub fn reset_to_new(&mut self, now: Timestamp) {
        self.pubkey = None;
        self.state = SessionState::New;
        self.challenge_nonce = None;
        self.step_deadline_ts = Some(now + HANDSHAKE_STEP_TIMEOUT_SECS as Timestamp);
    }

    pub fn has_timed_out(&self, now: Timestamp) -> bool {
        matches!(
            self.state,
            SessionState::New | SessionState::AwaitChallenge | SessionState::AwaitAttest
        ) && self.step_deadline_ts.map(|d| now > d).unwrap_or(false)
    }

    pub fn reject(&mut self) {
        self.state = SessionState::Rejected;
        self.step_deadline_ts = None;
    }

    pub fn go_dormant(&mut self) {
        if self.state == SessionState::Active {
            self.state = SessionState::Dormant;
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}
