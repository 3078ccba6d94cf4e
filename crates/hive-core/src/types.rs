use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Monotone per-sender sequence number.
pub type Sequence = u64;

/// Monotone per-author version number (peer state, gossip).
pub type Version = u64;

// ── NodePubkey ───────────────────────────────────────────────────────────────

/// A node's stable identity: the 33-byte compressed secp256k1 public key
/// from the host Lightning node's wallet keystore. Lexicographic byte order
/// over this key is the canonical tie-break used throughout the protocol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePubkey(pub [u8; 33]);

impl NodePubkey {
    pub fn from_bytes(b: [u8; 33]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 33];
        if bytes.len() != 33 {
            // Reuse FromHexError::InvalidStringLength via a decode of a
            // deliberately short string — keeps the error type uniform.
            return Err(hex::decode("0").unwrap_err());
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for NodePubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NodePubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePubkey({}…)", &self.to_hex()[..12])
    }
}

// ── HiveSignature ────────────────────────────────────────────────────────────

/// A compact (64-byte, r||s) secp256k1 ECDSA signature.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSignature(pub [u8; 64]);

impl HiveSignature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 64];
        if bytes.len() != 64 {
            return Err(hex::decode("0").unwrap_err());
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Lexicographic ordering over the raw signature bytes, used by the
    /// anti-entropy merge rule's final tie-break.
    pub fn lexicographically_smaller(&self, other: &Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Debug for HiveSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HiveSignature({}…)", &self.to_hex()[..12])
    }
}

// ── HiveId ───────────────────────────────────────────────────────────────────

/// Hive identifier: first 16 bytes of SHA-256(root_admin_pubkey || genesis_ts).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HiveId(pub [u8; 16]);

impl HiveId {
    pub fn derive(root_admin_pubkey: &NodePubkey, genesis_ts: Timestamp) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(root_admin_pubkey.as_bytes());
        hasher.update(genesis_ts.to_be_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[..16]);
        Self(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for HiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for HiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HiveId({})", self.to_hex())
    }
}

// ── IntentId ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(pub uuid::Uuid);

impl IntentId {
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn to_hyphenated(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntentId({})", self.0)
    }
}

// ── Membership tier ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Tier {
    /// Ordered so `Neophyte < Member < Admin`; tier monotonicity checks can
    /// compare with `>=` directly.
    Neophyte,
    Member,
    Admin,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Admin => "Admin",
            Tier::Member => "Member",
            Tier::Neophyte => "Neophyte",
        };
        write!(f, "{s}")
    }
}

// ── Capacity tier (C6) ───────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CapacityTier {
    Small,
    Medium,
    Large,
    XLarge,
}
