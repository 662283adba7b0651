// Response Envelope - read-only projection over a decoded server reply

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::error::{EnvelopeError, Result};
use super::task::TaskPayload;
use crate::port::FileService;

/// Status reported while the reply carries no task status
pub const SCHEDULED: &str = "scheduled";

/// Reads an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Reply {
    #[serde(default, deserialize_with = "lenient")]
    response: Option<TaskSlots>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskSlots {
    #[serde(default, deserialize_with = "lenient")]
    task_1: Option<TaskReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskReply {
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    task: Option<TaskRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskRecord {
    #[serde(default, deserialize_with = "lenient")]
    output_file: Option<String>,
    #[serde(default)]
    start_time: Option<Value>,
}

/// A server reply plus accessors for the `response.task_1` slot.
///
/// Every field of the reply is optional: a missing path is how the server says
/// "not finished yet", so accessors fall back instead of failing.
///
/// ```
/// use bytegenie_core::ResponseEnvelope;
/// use serde_json::json;
///
/// let resp = ResponseEnvelope::new(json!({
///     "response": { "task_1": { "status": "completed", "data": { "x": 1 } } }
/// })).unwrap();
/// assert_eq!(resp.status(), "completed");
/// assert_eq!(resp.data(), Some(&json!({ "x": 1 })));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ResponseEnvelope {
    raw: Value,
    #[serde(skip)]
    reply: Reply,
}

impl ResponseEnvelope {
    /// Wrap a decoded reply
    ///
    /// # Errors
    /// - EnvelopeError::NotAnObject if `raw` is not a JSON object
    pub fn new(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(EnvelopeError::NotAnObject(json_kind(&raw)));
        }
        let reply = Reply::deserialize(&raw).unwrap_or_default();
        Ok(Self { raw, reply })
    }

    /// Envelope recording a request that never produced a decodable reply
    pub fn failure(payload: &TaskPayload, error: impl std::fmt::Display) -> Self {
        let payload = serde_json::to_value(payload).unwrap_or(Value::Null);
        let raw = serde_json::json!({ "payload": payload, "error": error.to_string() });
        Self {
            raw,
            reply: Reply::default(),
        }
    }

    fn task_reply(&self) -> Option<&TaskReply> {
        self.reply.response.as_ref()?.task_1.as_ref()
    }

    fn task_record(&self) -> Option<&TaskRecord> {
        self.task_reply()?.task.as_ref()
    }

    /// Task status at the time of the call, `"scheduled"` when absent.
    ///
    /// A task queued in async mode keeps reporting its original status; use
    /// [`check_output_file_exists`](Self::check_output_file_exists) to see
    /// whether it has finished.
    pub fn status(&self) -> &str {
        self.task_reply()
            .and_then(|t| t.status.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(SCHEDULED)
    }

    /// Data returned with the reply, if any
    pub fn data(&self) -> Option<&Value> {
        self.task_reply().and_then(|t| t.data.as_ref())
    }

    /// Server-side path the task writes its output to
    pub fn output_file(&self) -> Option<&str> {
        self.task_record()
            .and_then(|t| t.output_file.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Task start time as the server sent it
    pub fn start_time(&self) -> Option<&Value> {
        self.task_record().and_then(|t| t.start_time.as_ref())
    }

    /// Transport or decode error recorded by a failed call
    pub fn error(&self) -> Option<&str> {
        self.raw.get("error").and_then(Value::as_str)
    }

    /// True when the request failed, as opposed to the task still running
    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }

    /// Payload of the failed request, if this envelope records a failure
    pub fn failed_payload(&self) -> Option<&Value> {
        if self.is_failure() {
            self.raw.get("payload")
        } else {
            None
        }
    }

    /// The reply exactly as received
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consume the envelope, returning the raw reply
    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// Whether the task's output file exists yet.
    ///
    /// Returns `false` without calling `files` when no output file is recorded.
    pub async fn check_output_file_exists(&self, files: &dyn FileService) -> bool {
        match self.output_file() {
            Some(path) => files
                .check_file_exists(path)
                .await
                .data()
                .is_some_and(is_truthy),
            None => false,
        }
    }

    /// Read the task's output file, if it exists yet.
    ///
    /// Makes one existence check and at most one read; there is no wait loop.
    pub async fn read_output_data(&self, files: &dyn FileService) -> Option<Value> {
        if !self.check_output_file_exists(files).await {
            warn!(
                output_file = self.output_file().unwrap_or_default(),
                "output does not yet exist: wait some more"
            );
            return None;
        }
        let path = self.output_file()?;
        files.read_file(path).await.data().cloned()
    }

    /// Data returned with the reply, or else the contents of the output file
    pub async fn output(&self, files: &dyn FileService) -> Option<Value> {
        match self.data() {
            Some(data) => Some(data.clone()),
            None => self.read_output_data(files).await,
        }
    }

    /// One attribute of the output.
    ///
    /// For a list of records this is the distinct values of column `attr` in
    /// first-seen order; for a mapping it is the value stored under `attr`.
    pub async fn output_attr(&self, files: &dyn FileService, attr: &str) -> Option<Value> {
        let output = self.output(files).await?;
        match output {
            Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
                if !rows.iter().any(|row| row.get(attr).is_some()) {
                    let mut columns: Vec<&str> = Vec::new();
                    for key in rows.iter().filter_map(Value::as_object).flat_map(|r| r.keys()) {
                        if !columns.contains(&key.as_str()) {
                            columns.push(key);
                        }
                    }
                    error!(attr, available = ?columns, "attribute not found in output data");
                    return None;
                }
                let mut values: Vec<Value> = Vec::new();
                for value in rows.iter().map(|row| row.get(attr).cloned().unwrap_or(Value::Null)) {
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
                Some(Value::Array(values))
            }
            Value::Object(mut map) => match map.remove(attr) {
                Some(value) => Some(value),
                None => {
                    let available: Vec<&String> = map.keys().collect();
                    error!(attr, ?available, "attribute not found in output data");
                    None
                }
            },
            other => {
                error!(attr, kind = json_kind(&other), "output data has no attributes");
                None
            }
        }
    }
}

impl TryFrom<Value> for ResponseEnvelope {
    type Error = EnvelopeError;

    fn try_from(raw: Value) -> Result<Self> {
        Self::new(raw)
    }
}

/// JavaScript-style truthiness of a reply value
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{CalcMode, ClusterArgs, TaskArgs, TaskMode, TaskSpec};
    use crate::port::file_service::mocks::MockFileService;
    use serde_json::json;

    fn envelope(raw: Value) -> ResponseEnvelope {
        ResponseEnvelope::new(raw).unwrap()
    }

    fn queued(output_file: &str) -> ResponseEnvelope {
        envelope(json!({
            "response": { "task_1": {
                "status": "scheduled",
                "task": { "output_file": output_file, "start_time": "2024-01-01 10:00:00" }
            } }
        }))
    }

    #[test]
    fn test_missing_response_defaults() {
        let resp = envelope(json!({ "message": "accepted" }));

        assert_eq!(resp.status(), "scheduled");
        assert!(resp.data().is_none());
        assert!(resp.output_file().is_none());
        assert!(!resp.is_failure());
    }

    #[test]
    fn test_completed_task() {
        let resp = envelope(json!({
            "response": { "task_1": { "status": "done", "data": { "x": 1 } } }
        }));

        assert_eq!(resp.status(), "done");
        assert_eq!(resp.data(), Some(&json!({ "x": 1 })));
    }

    #[test]
    fn test_output_file_and_start_time() {
        let resp = queued("a/b.csv");

        assert_eq!(resp.output_file(), Some("a/b.csv"));
        assert_eq!(resp.start_time(), Some(&json!("2024-01-01 10:00:00")));
    }

    #[test]
    fn test_wrong_shapes_are_treated_as_absent() {
        let resp = envelope(json!({ "response": "oops" }));
        assert_eq!(resp.status(), "scheduled");

        let resp = envelope(json!({
            "response": { "task_1": { "status": 7, "data": null, "task": [1, 2] } }
        }));
        assert_eq!(resp.status(), "scheduled");
        assert!(resp.data().is_none());
        assert!(resp.output_file().is_none());

        let resp = envelope(json!({ "response": { "task_1": { "status": "" } } }));
        assert_eq!(resp.status(), "scheduled");
    }

    #[test]
    fn test_falsy_data_is_still_data() {
        let resp = envelope(json!({ "response": { "task_1": { "data": false } } }));
        assert_eq!(resp.data(), Some(&json!(false)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            ResponseEnvelope::new(json!("text")).unwrap_err(),
            EnvelopeError::NotAnObject("string")
        );
        assert!(ResponseEnvelope::new(Value::Null).is_err());
        assert!(ResponseEnvelope::new(json!([1, 2])).is_err());
        assert!(ResponseEnvelope::try_from(json!(3)).is_err());
    }

    #[test]
    fn test_failure_envelope() {
        let payload = TaskPayload::new(
            "key",
            TaskSpec {
                func: "slugify".to_string(),
                args: TaskArgs::new(),
                overwrite: false,
                overwrite_base_output: false,
                return_data: true,
                verbose: true,
                task_mode: TaskMode::Async,
                calc_mode: CalcMode::Async,
                cluster: ClusterArgs::default(),
            },
        );
        let resp = ResponseEnvelope::failure(&payload, "connection refused");

        assert!(resp.is_failure());
        assert_eq!(resp.error(), Some("connection refused"));
        assert_eq!(resp.status(), "scheduled");
        assert!(resp.data().is_none());
        assert_eq!(
            resp.failed_payload().unwrap()["tasks"]["task_1"]["func"],
            "slugify"
        );
    }

    #[tokio::test]
    async fn test_check_without_output_file_makes_no_call() {
        let files = MockFileService::new();
        let resp = envelope(json!({}));

        assert!(!resp.check_output_file_exists(&files).await);
        assert_eq!(files.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_read_output_data_when_ready() {
        let files = MockFileService::new().with_file("out/slug.csv", json!([{ "slug": "a-b" }]));
        let resp = queued("out/slug.csv");

        assert!(resp.check_output_file_exists(&files).await);
        let data = resp.read_output_data(&files).await;
        assert_eq!(data, Some(json!([{ "slug": "a-b" }])));
        assert_eq!(files.read_calls(), 1);
    }

    #[tokio::test]
    async fn test_read_output_data_not_ready() {
        let files = MockFileService::new();
        let resp = queued("out/missing.csv");

        assert!(resp.read_output_data(&files).await.is_none());
        assert_eq!(files.check_calls(), 1);
        assert_eq!(files.read_calls(), 0);
    }

    #[tokio::test]
    async fn test_output_prefers_returned_data() {
        let files = MockFileService::new();
        let resp = envelope(json!({ "response": { "task_1": { "data": [1, 2] } } }));

        assert_eq!(resp.output(&files).await, Some(json!([1, 2])));
        assert_eq!(files.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_output_attr() {
        let files = MockFileService::new().with_file(
            "out/docs.csv",
            json!([
                { "doc_name": "a", "year": 2020 },
                { "doc_name": "b", "year": 2021 },
                { "doc_name": "a", "year": 2022 }
            ]),
        );
        let resp = queued("out/docs.csv");

        assert_eq!(
            resp.output_attr(&files, "doc_name").await,
            Some(json!(["a", "b"]))
        );
        assert!(resp.output_attr(&files, "company").await.is_none());

        let resp = envelope(json!({
            "response": { "task_1": { "data": { "doc_name": "c" } } }
        }));
        assert_eq!(resp.output_attr(&files, "doc_name").await, Some(json!("c")));
        assert!(resp.output_attr(&files, "year").await.is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}
