//! Resale engine: streaming transport and effect execution.
mod decode;
mod engine;
mod fetch;
mod form;
mod lens;
mod preview;
mod types;

pub use decode::LineDecoder;
pub use engine::EngineHandle;
pub use fetch::{ChannelFrameSink, FrameSink, ReqwestStreamer, StreamSettings, Streamer, STREAM_PATH};
pub use form::guess_mime;
pub use lens::{CandidateSource, ReqwestLensClient, LENS_PATH};
pub use preview::{Preview, PreviewRegistry};
pub use types::{EngineEvent, FailureKind, FetchError, LensResponse, StreamSummary};
