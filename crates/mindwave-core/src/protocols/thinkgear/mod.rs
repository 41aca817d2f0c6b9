//! ThinkGear serial protocol decoding.
//!
//! Frames are `[0xAA][0xAA][LEN][payload][CHECKSUM]`. The checksum is the
//! one's complement of the low byte of the payload sum. A length byte of 170
//! is an extended-sync escape and lengths above 170 are rejected, so accepted
//! payloads never exceed 169 bytes.
//!
//! Payloads are a sequence of code-tagged records: single-byte values for
//! signal quality, attention, meditation and blink strength, a signed 16-bit
//! raw sample, and a 24-byte block of eight 24-bit EEG band powers.
//! Unrecognized codes are skipped; a record that runs off the end of the
//! payload rejects the frame.
//!
//! Byte positions and codes live in `layout`, bounds-checked reads in
//! `reader`, and the decoding grammar in `parser`.

pub mod checksum;
pub mod error;
pub mod frame;
pub mod layout;
pub mod parser;
pub mod reader;

pub use checksum::{compute_checksum, verify_checksum};
pub use error::ThinkGearError;
pub use frame::{LengthByte, RawFrame, classify_length, encode_frame};
pub use parser::{decode_frame, parse_payload};
