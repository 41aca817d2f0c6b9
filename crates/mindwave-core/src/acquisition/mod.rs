//! Live acquisition: frame scanning, the decode loop and its controller.
//!
//! A run owns its byte source on a background thread. The scanner hunts for
//! sync and reads candidate frames, the protocol layer validates and decodes
//! them, and the sink dispatches callbacks, records history and feeds
//! subscribers. Only the cancel token crosses from the caller to the loop.

mod cancel;
mod controller;
mod scanner;
mod session;
mod sink;
mod stats;
mod store;

pub use cancel::CancelToken;
pub use controller::{AcquisitionController, AcquisitionError, AcquisitionState};
pub use session::{decode_source, decode_source_until};
pub use sink::{CallbackRegistry, SampleSink};
pub use stats::{FrameCounters, FrameStats};
pub use store::TimeSeriesStore;
