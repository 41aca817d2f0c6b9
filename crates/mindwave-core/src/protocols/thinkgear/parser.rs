use crate::sample::{Metric, Reading};

use super::checksum::compute_checksum;
use super::error::ThinkGearError;
use super::frame::RawFrame;
use super::layout;
use super::reader::PayloadReader;

/// Decode a payload into readings, in payload order.
///
/// Unrecognized code bytes are skipped one byte at a time. A record that
/// runs past the end of the payload rejects the whole payload.
pub fn parse_payload(payload: &[u8]) -> Result<Vec<Reading>, ThinkGearError> {
    let mut reader = PayloadReader::new(payload);
    let mut readings = Vec::new();

    while let Some(code) = reader.next_code() {
        match code {
            layout::CODE_POOR_SIGNAL => readings.push(Reading::PoorSignal(reader.read_u8(code)?)),
            layout::CODE_ATTENTION => readings.push(Reading::Attention(reader.read_u8(code)?)),
            layout::CODE_MEDITATION => readings.push(Reading::Meditation(reader.read_u8(code)?)),
            layout::CODE_BLINK_STRENGTH => {
                readings.push(Reading::BlinkStrength(reader.read_u8(code)?))
            }
            layout::CODE_RAW_VALUE => {
                reader.require(code, 1 + layout::RAW_VALUE_WIDTH)?;
                reader.skip_length(code)?;
                readings.push(Reading::RawValue(reader.read_i16_be(code)?));
            }
            layout::CODE_EEG_POWER => {
                reader.require(code, 1 + layout::EEG_POWER_WIDTH)?;
                reader.skip_length(code)?;
                for band in Metric::EEG_BANDS {
                    let value = reader.read_u24_be(code)?;
                    readings.extend(Reading::eeg_band(band, value));
                }
            }
            _ => {}
        }
    }

    Ok(readings)
}

/// Validate a raw frame's checksum and decode its payload.
pub fn decode_frame(frame: &RawFrame) -> Result<Vec<Reading>, ThinkGearError> {
    if frame.payload.len() > layout::MAX_PAYLOAD_LEN {
        return Err(ThinkGearError::PayloadTooLong {
            length: frame.payload.len(),
            max: layout::MAX_PAYLOAD_LEN,
        });
    }
    let expected = compute_checksum(&frame.payload);
    if expected != frame.checksum {
        return Err(ThinkGearError::ChecksumMismatch {
            expected,
            actual: frame.checksum,
        });
    }
    parse_payload(&frame.payload)
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, parse_payload};
    use crate::protocols::thinkgear::checksum::compute_checksum;
    use crate::protocols::thinkgear::error::ThinkGearError;
    use crate::protocols::thinkgear::frame::RawFrame;
    use crate::sample::{Metric, Reading};

    fn frame(payload: &[u8]) -> RawFrame {
        RawFrame {
            payload: payload.to_vec(),
            checksum: compute_checksum(payload),
        }
    }

    #[test]
    fn parse_single_byte_codes() {
        let readings = parse_payload(&[0x02, 0x00, 0x04, 0x32, 0x05, 0x0A, 0x16, 0x7F]).unwrap();
        assert_eq!(
            readings,
            vec![
                Reading::PoorSignal(0),
                Reading::Attention(50),
                Reading::Meditation(10),
                Reading::BlinkStrength(127),
            ]
        );
    }

    #[test]
    fn raw_value_boundaries() {
        let cases = [
            ([0x7F, 0xFF], 32767),
            ([0x80, 0x00], -32768),
            ([0x80, 0x01], -32767),
            ([0xFF, 0xFF], -1),
            ([0x00, 0x00], 0),
        ];
        for (bytes, expected) in cases {
            let readings = parse_payload(&[0x80, 0x02, bytes[0], bytes[1]]).unwrap();
            assert_eq!(readings, vec![Reading::RawValue(expected)], "{bytes:02x?}");
        }
    }

    #[test]
    fn eeg_block_maps_bands_in_order() {
        let mut payload = vec![0x83, 0x18];
        for band in 0..8u8 {
            payload.extend_from_slice(&[band, band + 0x10, band + 0x20]);
        }
        let readings = parse_payload(&payload).unwrap();
        assert_eq!(readings.len(), 8);
        for (index, (reading, metric)) in readings.iter().zip(Metric::EEG_BANDS).enumerate() {
            let band = index as u32;
            assert_eq!(reading.metric(), metric);
            assert_eq!(
                reading.value() as u32,
                (band << 16) | ((band + 0x10) << 8) | (band + 0x20)
            );
        }
    }

    #[test]
    fn unknown_codes_are_skipped_one_byte_at_a_time() {
        let readings = parse_payload(&[0x55, 0x04, 0x20, 0xFE]).unwrap();
        assert_eq!(readings, vec![Reading::Attention(0x20)]);
    }

    #[test]
    fn truncated_single_byte_code_is_malformed() {
        let err = parse_payload(&[0x04, 0x20, 0x05]).unwrap_err();
        assert!(matches!(err, ThinkGearError::Truncated { code: 0x05, .. }));
    }

    #[test]
    fn truncated_eeg_block_yields_no_partial_bands() {
        let mut payload = vec![0x04, 0x10, 0x83, 0x18];
        payload.extend_from_slice(&[0u8; 23]);
        let err = parse_payload(&payload).unwrap_err();
        assert_eq!(
            err,
            ThinkGearError::Truncated {
                code: 0x83,
                needed: 25,
                remaining: 24
            }
        );
    }

    #[test]
    fn truncated_raw_value_is_malformed() {
        let err = parse_payload(&[0x80, 0x02, 0x01]).unwrap_err();
        assert!(matches!(err, ThinkGearError::Truncated { code: 0x80, .. }));
    }

    #[test]
    fn decode_frame_accepts_correct_checksum() {
        let readings = decode_frame(&frame(&[0x04, 0x32])).unwrap();
        assert_eq!(readings, vec![Reading::Attention(50)]);
    }

    #[test]
    fn decode_frame_rejects_flipped_checksum() {
        let mut raw = frame(&[0x04, 0x32]);
        raw.checksum ^= 0x01;
        let err = decode_frame(&raw).unwrap_err();
        assert_eq!(
            err,
            ThinkGearError::ChecksumMismatch {
                expected: 0xC9,
                actual: 0xC8
            }
        );
    }

    #[test]
    fn decode_empty_payload_yields_no_readings() {
        assert!(decode_frame(&frame(&[])).unwrap().is_empty());
    }
}
