/// Compute the frame checksum: one's complement of the low byte of the
/// payload sum.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use mindwave_core::protocols::thinkgear::checksum::compute_checksum;
///
/// assert_eq!(compute_checksum(&[0x04, 0x32]), 0xC9);
/// ```
pub fn compute_checksum(payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(0u32, |acc, byte| acc.wrapping_add(u32::from(*byte)));
    !(sum as u8)
}

pub fn verify_checksum(payload: &[u8], checksum: u8) -> bool {
    compute_checksum(payload) == checksum
}
