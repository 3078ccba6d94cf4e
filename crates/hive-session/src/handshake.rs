use serde::{Deserialize, Serialize};

use hive_core::{HiveError, HiveId, HiveSignature, InvitationTicket, MemberRecord, NodePubkey, Timestamp};
use hive_crypto::{verify, Signable};
use hive_state::HiveStateDb;

use crate::state::{PeerSession, SessionState};

// ── Wire payloads (spec §4.4 step 1-5) ──────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HelloPayload {
    pub ticket: InvitationTicket,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengePayload {
    pub nonce: [u8; 32],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttestManifest {
    pub pubkey: NodePubkey,
    pub software_version: String,
    pub features: Vec<String>,
    pub nonce_sig: HiveSignature,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttestPayload {
    pub manifest: AttestManifest,
    pub signature: HiveSignature,
}

impl Signable for AttestManifest {
    fn signing_bytes(&self) -> Vec<u8> {
        hive_codec::canonical_bytes_for_signing(
            serde_json::to_value(self).expect("attest manifest always serializes"),
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WelcomePayload {
    pub hive_id: HiveId,
    pub member_snapshot: Vec<MemberRecord>,
}

/// A feature claimed in an `HIVE_ATTEST` manifest that the peer must verify
/// against the live host before accepting the session (spec §4.4 step 4).
/// Implemented by the caller, which owns the host adapter handle; kept out
/// of `hive-session` to avoid a dependency on `hive-hostadapter`.
pub trait FeatureProbe {
    fn probe(&self, feature: &str) -> bool;
}

/// Step 1: validate an inbound `HIVE_HELLO`. Checks ticket expiry, issuer
/// signature against a known admin pubkey, and single-use nonce consumption.
pub fn validate_hello(
    db: &HiveStateDb,
    hello: &HelloPayload,
    admins: &[NodePubkey],
    now: Timestamp,
) -> Result<(), HiveError> {
    let ticket = &hello.ticket;
    if now >= ticket.expires_ts {
        return Err(HiveError::InvalidTicket("ticket expired".into()));
    }
    if !admins.contains(&ticket.issuer_pubkey) {
        return Err(HiveError::InvalidTicket("issuer is not a known admin".into()));
    }
    let signing_bytes = ticket_signing_bytes(ticket);
    if !verify(&ticket.issuer_pubkey, &signing_bytes, &ticket.issuer_signature) {
        return Err(HiveError::InvalidSignature);
    }
    if db.is_nonce_consumed(&ticket.nonce)? {
        return Err(HiveError::InvalidTicket("ticket nonce already consumed".into()));
    }
    Ok(())
}

fn ticket_signing_bytes(ticket: &InvitationTicket) -> Vec<u8> {
    let value = serde_json::json!({
        "issuer_pubkey": ticket.issuer_pubkey.to_hex(),
        "nonce": hex::encode(ticket.nonce),
        "issued_ts": ticket.issued_ts,
        "expires_ts": ticket.expires_ts,
        "requirement_bitmask": ticket.requirement_bitmask,
    });
    hive_codec::to_canonical_bytes(&value)
}

/// Step 3/4: validate an inbound `HIVE_ATTEST` against the challenge nonce
/// this session issued, then probe every claimed feature live against the
/// host. Any unverifiable feature rejects the whole attestation.
pub fn validate_attest(
    session: &PeerSession,
    attest: &AttestPayload,
    probe: &dyn FeatureProbe,
) -> Result<(), HiveError> {
    let nonce = session
        .challenge_nonce
        .ok_or_else(|| HiveError::ProtocolError("no challenge nonce outstanding".into()))?;

    if !verify(
        &attest.manifest.pubkey,
        &nonce,
        &attest.manifest.nonce_sig,
    ) {
        return Err(HiveError::InvalidSignature);
    }

    let manifest_bytes = attest.manifest.signing_bytes();
    if !verify(&attest.manifest.pubkey, &manifest_bytes, &attest.signature) {
        return Err(HiveError::InvalidSignature);
    }

    for feature in &attest.manifest.features {
        if !probe.probe(feature) {
            return Err(HiveError::ProtocolError(format!(
                "unverifiable feature claim: {feature}"
            )));
        }
    }
    Ok(())
}

/// Drives the NEW → AWAIT_CHALLENGE transition. Caller sends the resulting
/// `ChallengePayload` to the peer.
pub fn issue_challenge(session: &mut PeerSession, now: Timestamp, nonce: [u8; 32]) -> ChallengePayload {
    session.challenge_nonce = Some(nonce);
    session.state = SessionState::AwaitChallenge;
    session.arm_step_deadline(now);
    ChallengePayload { nonce }
}

/// Drives the AWAIT_CHALLENGE → AWAIT_ATTEST transition once we've sent our
/// challenge and are waiting on the peer's attest.
pub fn await_attest(session: &mut PeerSession, now: Timestamp) {
    session.state = SessionState::AwaitAttest;
    session.arm_step_deadline(now);
}

/// Drives the AWAIT_ATTEST → ACTIVE transition after a successful
/// `validate_attest`. Returns the `HIVE_WELCOME` payload to send back.
pub fn activate(
    session: &mut PeerSession,
    pubkey: NodePubkey,
    hive_id: HiveId,
    member_snapshot: Vec<MemberRecord>,
    now: Timestamp,
) -> WelcomePayload {
    session.pubkey = Some(pubkey);
    session.state = SessionState::Active;
    session.step_deadline_ts = None;
    session.last_seen_ts = now;
    WelcomePayload {
        hive_id,
        member_snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllowAll;
    impl FeatureProbe for AllowAll {
        fn probe(&self, _feature: &str) -> bool {
            true
        }
    }

    struct DenyAll;
    impl FeatureProbe for DenyAll {
        fn probe(&self, _feature: &str) -> bool {
            false
        }
    }

    fn signed_attest(identity: &hive_crypto::Identity, nonce: [u8; 32]) -> AttestPayload {
        let nonce_sig = identity.sign(&nonce);
        let manifest = AttestManifest {
            pubkey: identity.pubkey(),
            software_version: "1.0.0".into(),
            features: vec!["splice".into()],
            nonce_sig,
        };
        let signature = identity.sign(&manifest.signing_bytes());
        AttestPayload { manifest, signature }
    }

    #[test]
    fn valid_attest_with_allowed_features_passes() {
        let identity = hive_crypto::Identity::generate();
        let mut session = PeerSession::new(1_000);
        session.challenge_nonce = Some([7u8; 32]);
        let attest = signed_attest(&identity, [7u8; 32]);
        assert!(validate_attest(&session, &attest, &AllowAll).is_ok());
    }

    #[test]
    fn unverifiable_feature_is_rejected() {
        let identity = hive_crypto::Identity::generate();
        let mut session = PeerSession::new(1_000);
        session.challenge_nonce = Some([7u8; 32]);
        let attest = signed_attest(&identity, [7u8; 32]);
        let err = validate_attest(&session, &attest, &DenyAll).unwrap_err();
        assert!(matches!(err, HiveError::ProtocolError(_)));
    }

    #[test]
    fn wrong_nonce_signature_is_rejected() {
        let identity = hive_crypto::Identity::generate();
        let mut session = PeerSession::new(1_000);
        session.challenge_nonce = Some([9u8; 32]);
        let attest = signed_attest(&identity, [1u8; 32]);
        let err = validate_attest(&session, &attest, &AllowAll).unwrap_err();
        assert!(matches!(err, HiveError::InvalidSignature));
    }
}
