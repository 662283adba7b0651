// ByteGenie Core - Task payloads, response envelopes & ports
// NO transport dependencies: the HTTP adapter lives in bytegenie-sdk

pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::{ClientConfig, Secrets};
pub use domain::{
    CalcMode, ClusterArgs, EnvelopeError, ResponseBatch, ResponseEnvelope, TaskMode,
    TaskPayload, TaskSpec,
};
pub use error::{AppError, Result};
pub use port::FileService;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
