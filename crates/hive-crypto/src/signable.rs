/// Shared signing path for every message/ticket/vouch type: implementors
/// produce the exact canonical bytes a signature commits to, so all
/// call sites hash-then-sign the same way instead of re-deriving
/// canonicalization rules per type.
pub trait Signable {
    /// Canonical bytes to sign, with any signature slot already excluded
    /// or replaced by a sentinel by the implementor.
    fn signing_bytes(&self) -> Vec<u8>;
}
