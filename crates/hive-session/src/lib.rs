pub mod handshake;
pub mod replay;
pub mod state;

pub use handshake::{
    activate, await_attest, issue_challenge, validate_attest, validate_hello, AttestManifest,
    AttestPayload, ChallengePayload, FeatureProbe, HelloPayload, WelcomePayload,
};
pub use replay::check_replay;
pub use state::{PeerErrorWindow, PeerSession, SessionState};
