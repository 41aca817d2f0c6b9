use super::checksum::compute_checksum;
use super::error::ThinkGearError;
use super::layout;

/// Payload and trailing checksum as read off the wire, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub payload: Vec<u8>,
    pub checksum: u8,
}

/// How the scanner must treat a length byte read right after sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthByte {
    Payload(usize),
    ExtendedSync,
    Oversized(u8),
}

pub fn classify_length(byte: u8) -> LengthByte {
    match byte {
        layout::EXTENDED_SYNC_LEN => LengthByte::ExtendedSync,
        b if b > layout::EXTENDED_SYNC_LEN => LengthByte::Oversized(b),
        b => LengthByte::Payload(b as usize),
    }
}

/// Encode a payload as a complete wire frame with a correct checksum.
///
/// # Examples
/// ```
/// use mindwave_core::protocols::thinkgear::encode_frame;
///
/// let frame = encode_frame(&[0x04, 0x32]).unwrap();
/// assert_eq!(frame, vec![0xAA, 0xAA, 0x02, 0x04, 0x32, 0xC9]);
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, ThinkGearError> {
    if payload.len() > layout::MAX_PAYLOAD_LEN {
        return Err(ThinkGearError::PayloadTooLong {
            length: payload.len(),
            max: layout::MAX_PAYLOAD_LEN,
        });
    }
    let mut frame = Vec::with_capacity(layout::SYNC_LEN + payload.len() + 2);
    frame.extend_from_slice(&[layout::SYNC; layout::SYNC_LEN]);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(compute_checksum(payload));
    Ok(frame)
}
