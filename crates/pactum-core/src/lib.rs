pub mod labels;
pub mod prob;
pub mod schema;

pub use labels::Labels;
pub use schema::{
    BatchExplainRequest, BatchExplainResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
    ValidationError, MAX_BATCH_ITEMS, MIN_TEXT_LEN,
};
