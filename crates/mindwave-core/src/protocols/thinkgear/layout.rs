pub const SYNC: u8 = 0xAA;
pub const SYNC_LEN: usize = 2;

/// Length byte reserved as an extended-sync escape; the real length follows.
pub const EXTENDED_SYNC_LEN: u8 = 170;
pub const MAX_PAYLOAD_LEN: usize = 169;

pub const CODE_POOR_SIGNAL: u8 = 0x02;
pub const CODE_ATTENTION: u8 = 0x04;
pub const CODE_MEDITATION: u8 = 0x05;
pub const CODE_BLINK_STRENGTH: u8 = 0x16;
pub const CODE_RAW_VALUE: u8 = 0x80;
pub const CODE_EEG_POWER: u8 = 0x83;

pub const RAW_VALUE_WIDTH: usize = 2;
pub const EEG_BAND_COUNT: usize = 8;
pub const EEG_BAND_WIDTH: usize = 3;
pub const EEG_POWER_WIDTH: usize = EEG_BAND_COUNT * EEG_BAND_WIDTH;
