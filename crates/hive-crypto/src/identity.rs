use hive_core::{HiveError, NodePubkey, HiveSignature, SIGNING_DOMAIN_PREFIX};
use secp256k1::ecdsa::Signature as Secp256k1Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Domain-separated digest of `message_bytes`: SHA-256(`SIGNING_DOMAIN_PREFIX` || bytes).
///
/// Every signature in the protocol commits to this digest, never to raw
/// bytes, so a signature produced for one protocol version can never be
/// replayed as valid input to another.
pub fn domain_digest(message_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SIGNING_DOMAIN_PREFIX);
    hasher.update(message_bytes);
    let out = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&out);
    digest
}

/// A node's signing identity: the secp256k1 keypair backing its stable
/// `NodePubkey`. In a production deployment this key is held by the host
/// Lightning node's wallet and signing is delegated across the host-adapter
/// boundary; this struct holds the equivalent raw key material locally for
/// standalone operation, testing, and development.
pub struct Identity {
    pubkey: NodePubkey,
    secret_bytes: Vec<u8>,
}

impl Identity {
    /// Generate a fresh random identity. Not reproducible — development/test only.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
        Self::from_parts(secret_key, public_key)
    }

    /// Load an identity from a 32-byte secret key, as obtained from the host
    /// wallet keystore or an operator-supplied config.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, HiveError> {
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| HiveError::ConfigError(format!("invalid secret key: {e}")))?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self::from_parts(secret_key, public_key))
    }

    fn from_parts(secret_key: SecretKey, public_key: PublicKey) -> Self {
        let pubkey = NodePubkey(public_key.serialize());
        Self {
            pubkey,
            secret_bytes: secret_key.secret_bytes().to_vec(),
        }
    }

    /// Cached node identity.
    pub fn pubkey(&self) -> NodePubkey {
        self.pubkey
    }

    /// Sign `message_bytes` after domain-separated hashing.
    pub fn sign(&self, message_bytes: &[u8]) -> HiveSignature {
        let secret_key =
            SecretKey::from_slice(&self.secret_bytes).expect("stored secret key is valid");
        let digest = domain_digest(message_bytes);
        let msg = Message::from_digest(digest);
        let secp = Secp256k1::new();
        let sig = secp.sign_ecdsa(&msg, &secret_key);
        HiveSignature(sig.serialize_compact())
    }
}

impl Drop for Identity {
    fn drop(&mut self) {
        self.secret_bytes.zeroize();
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity {{ pubkey: {:?} }}", self.pubkey)
    }
}

/// Verify `signature` over `message_bytes` against `pubkey`.
pub fn verify(pubkey: &NodePubkey, message_bytes: &[u8], signature: &HiveSignature) -> bool {
    let Ok(public_key) = PublicKey::from_slice(pubkey.as_bytes()) else {
        return false;
    };
    let Ok(sig) = Secp256k1Signature::from_compact(&signature.0) else {
        return false;
    };
    let digest = domain_digest(message_bytes);
    let msg = Message::from_digest(digest);
    let secp = Secp256k1::new();
    secp.verify_ecdsa(&msg, &sig, &public_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_roundtrips() {
        let identity = Identity::generate();
        let msg = b"hello hive";
        let sig = identity.sign(msg);
        assert!(verify(&identity.pubkey(), msg, &sig));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let identity = Identity::generate();
        let sig = identity.sign(b"hello hive");
        assert!(!verify(&identity.pubkey(), b"hello hive!", &sig));
    }

    #[test]
    fn wrong_pubkey_fails_verification() {
        let a = Identity::generate();
        let b = Identity::generate();
        let sig = a.sign(b"hello hive");
        assert!(!verify(&b.pubkey(), b"hello hive", &sig));
    }
}
