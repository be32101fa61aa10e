// Error taxonomy for the generation/write pipeline
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitalError {
    /// Malformed generation parameters, detected before any work starts.
    #[error("invalid generation config: {0}")]
    Validation(String),

    /// Unexpected failure inside the generation loop.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A cancellation request was observed at a batch boundary.
    /// Batches emitted before this point are valid and intentionally incomplete.
    #[error("generation cancelled")]
    Cancelled,

    /// The sink rejected a write; the message is the sink's verbatim response.
    #[error("sink write failed: {0}")]
    SinkWrite(String),

    #[error("sink read failed: {0}")]
    SinkRead(String),

    #[error("sink delete failed: {0}")]
    SinkDelete(String),
}

pub type Result<T> = std::result::Result<T, VitalError>;
