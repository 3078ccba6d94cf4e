pub mod canonical;
pub mod error;
pub mod frame;
pub mod message;
pub mod payloads;

pub use canonical::{canonical_bytes_for_signing, parse_payload, to_canonical_bytes, SIG_SENTINEL};
pub use error::CodecError;
pub use frame::{decode_frame, encode_frame};
pub use message::MessageKind;
pub use payloads::{BanAnnouncement, PromotionAnnouncement};
