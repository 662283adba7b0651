// File Service Port
// Server-side file lookups used to poll the output of queued tasks

use crate::domain::ResponseEnvelope;
use async_trait::async_trait;

/// Remote file-service calls consumed by [`ResponseEnvelope`]
///
/// Implementations:
/// - ByteGenieClient (bytegenie-sdk): issues `check_file_exists` / `read_file`
///   tasks in synchronous task mode
/// - MockFileService: in-memory files for tests
#[async_trait]
pub trait FileService: Send + Sync {
    /// Ask the server whether `path` exists.
    ///
    /// The answer is the envelope's `data()`; anything other than a truthy
    /// value means "not yet".
    async fn check_file_exists(&self, path: &str) -> ResponseEnvelope;

    /// Read the contents of `path`; the contents are the envelope's `data()`.
    async fn read_file(&self, path: &str) -> ResponseEnvelope;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock FileService backed by an in-memory file table
    #[derive(Clone, Default)]
    pub struct MockFileService {
        files: Arc<Mutex<HashMap<String, Value>>>,
        check_calls: Arc<Mutex<usize>>,
        read_calls: Arc<Mutex<usize>>,
    }

    impl MockFileService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: impl Into<String>, contents: Value) -> Self {
            self.files.lock().unwrap().insert(path.into(), contents);
            self
        }

        pub fn check_calls(&self) -> usize {
            *self.check_calls.lock().unwrap()
        }

        pub fn read_calls(&self) -> usize {
            *self.read_calls.lock().unwrap()
        }

        fn reply(data: Value) -> ResponseEnvelope {
            ResponseEnvelope::new(json!({
                "response": { "task_1": { "status": "completed", "data": data } }
            }))
            .expect("mock reply is an object")
        }
    }

    #[async_trait]
    impl FileService for MockFileService {
        async fn check_file_exists(&self, path: &str) -> ResponseEnvelope {
            *self.check_calls.lock().unwrap() += 1;
            let exists = self.files.lock().unwrap().contains_key(path);
            Self::reply(Value::Bool(exists))
        }

        async fn read_file(&self, path: &str) -> ResponseEnvelope {
            *self.read_calls.lock().unwrap() += 1;
            let contents = self.files.lock().unwrap().get(path).cloned();
            Self::reply(contents.unwrap_or(Value::Null))
        }
    }
}
