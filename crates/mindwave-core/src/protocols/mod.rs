//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: sync bytes, limits and record codes (source of truth)
//! - `reader`: safe byte access over a payload
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; byte sources and the acquisition
//! layer handle reading and dispatch.

pub mod thinkgear;
