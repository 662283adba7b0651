// Domain Layer - Wire payloads and response projections

pub mod batch;
pub mod envelope;
pub mod error;
pub mod task;

// Re-exports
pub use batch::ResponseBatch;
pub use envelope::ResponseEnvelope;
pub use error::EnvelopeError;
pub use task::{CalcMode, ClusterArgs, TaskArgs, TaskMode, TaskPayload, TaskSlots, TaskSpec};
