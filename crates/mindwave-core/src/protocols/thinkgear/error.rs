use thiserror::Error;

/// Errors returned by ThinkGear frame validation and payload decoding.
///
/// # Examples
/// ```
/// use mindwave_core::protocols::thinkgear::ThinkGearError;
///
/// let err = ThinkGearError::ChecksumMismatch { expected: 0xFB, actual: 0xFA };
/// assert!(err.to_string().contains("checksum mismatch"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThinkGearError {
    #[error("checksum mismatch: computed {expected:#04x}, frame carried {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    #[error("payload too long: {length} bytes exceeds the {max} byte limit")]
    PayloadTooLong { length: usize, max: usize },
    #[error("truncated record for code {code:#04x}: need {needed} bytes, {remaining} remain")]
    Truncated {
        code: u8,
        needed: usize,
        remaining: usize,
    },
}
