//! Client side of the explainability pipeline: chunked dispatch to the
//! batch-explain endpoint with positional re-alignment and a whole-batch
//! uniform fail-safe.

mod http;

pub use http::{ClientError, ExplainClient, DEFAULT_CHUNK_SIZE};
