//! ByteGenie SDK - Rust Client Library
//!
//! Provides a client for the ByteGenie task-execution API: each call posts a
//! named remote function with its arguments and returns a [`ResponseEnvelope`].
//!
//! # Example
//!
//! ```no_run
//! use bytegenie_sdk::{ByteGenieClient, ClientConfig, TaskMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Queue the task and come back for its output later
//!     let client = ByteGenieClient::new(ClientConfig::default().with_task_mode(TaskMode::Async))?;
//!
//!     let resp = client.slugify("Hello World", None).await;
//!     println!("Task {}: {:?}", resp.status(), resp.output_file());
//!
//!     if let Some(data) = resp.read_output_data(&client).await {
//!         println!("Output: {}", data);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use bytegenie_core::config::{DEFAULT_API_URL, DEFAULT_SECRETS_FILE};
pub use bytegenie_core::{
    CalcMode, ClientConfig, ClusterArgs, FileService, ResponseBatch, ResponseEnvelope, Secrets,
    TaskMode, TaskPayload, TaskSpec,
};
pub use client::ByteGenieClient;
pub use error::{Result, SdkError};
pub use reqwest::Method;
pub use types::{
    CheckFileArgs, ListCorrespondingFilesArgs, ListDocFilesArgs, ReadFileArgs, ReadFilesArgs,
    SlugifyArgs, UploadDataArgs,
};
