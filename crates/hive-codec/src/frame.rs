use hive_core::FRAME_MAGIC;

use crate::error::CodecError;

const HEADER_LEN: usize = 4 + 2;

/// Encode a raw frame: `MAGIC(4) || TYPE(2, big-endian) || payload`.
pub fn encode_frame(msg_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&FRAME_MAGIC);
    out.extend_from_slice(&msg_type.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decode a raw frame. Returns `(msg_type, payload)`.
///
/// A non-matching magic returns `NotOurs` without consuming the bytes —
/// callers MUST leave the frame for the rest of the host's plugin chain
/// rather than treating this as fatal.
pub fn decode_frame(bytes: &[u8]) -> Result<(u16, &[u8]), CodecError> {
    if bytes.len() < 4 {
        return Err(CodecError::Truncated {
            need: HEADER_LEN,
            got: bytes.len(),
        });
    }
    if bytes[..4] != FRAME_MAGIC {
        return Err(CodecError::NotOurs);
    }
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated {
            need: HEADER_LEN,
            got: bytes.len(),
        });
    }
    let msg_type = u16::from_be_bytes([bytes[4], bytes[5]]);
    Ok((msg_type, &bytes[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let payload = b"{\"a\":1}";
        let frame = encode_frame(32_769, payload);
        let (ty, body) = decode_frame(&frame).unwrap();
        assert_eq!(ty, 32_769);
        assert_eq!(body, payload);
    }

    #[test]
    fn wrong_magic_is_not_ours() {
        let mut frame = encode_frame(32_769, b"{}");
        frame[3] = 0x4F; // "HIVO"
        assert!(matches!(decode_frame(&frame), Err(CodecError::NotOurs)));
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(
            decode_frame(&[0x48, 0x49]),
            Err(CodecError::Truncated { .. })
        ));
    }
}
