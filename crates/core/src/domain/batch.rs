// Response Batch - many envelopes read as one

use futures::future::join_all;
use serde_json::{Map, Value};

use super::envelope::ResponseEnvelope;
use crate::port::FileService;

/// Ordered collection of envelopes, e.g. one per uploaded document
#[derive(Debug, Clone, Default)]
pub struct ResponseBatch {
    responses: Vec<ResponseEnvelope>,
}

impl ResponseBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an envelope at the end of the batch
    pub fn push(&mut self, response: ResponseEnvelope) {
        self.responses.push(response);
    }

    /// Number of envelopes
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Envelope at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<&ResponseEnvelope> {
        self.responses.get(index)
    }

    /// Envelopes in batch order
    pub fn iter(&self) -> std::slice::Iter<'_, ResponseEnvelope> {
        self.responses.iter()
    }

    /// Read every output file concurrently; results keep the batch order.
    pub async fn read_output_data(&self, files: &dyn FileService) -> Vec<Option<Value>> {
        join_all(self.responses.iter().map(|r| r.read_output_data(files))).await
    }

    /// Output of every envelope, in batch order
    pub async fn outputs(&self, files: &dyn FileService) -> Vec<Option<Value>> {
        join_all(self.responses.iter().map(|r| r.output(files))).await
    }

    /// Outputs merged into one value.
    ///
    /// Missing outputs are dropped. Lists are flattened into one list and
    /// mappings are merged key-wise; mixed shapes stay a list of outputs.
    pub async fn concat_output(&self, files: &dyn FileService) -> Value {
        let outputs: Vec<Value> = self.outputs(files).await.into_iter().flatten().collect();
        concatenate(outputs)
    }

    /// `ResponseEnvelope::output_attr` of every envelope, in batch order
    pub async fn output_attrs(&self, files: &dyn FileService, attr: &str) -> Vec<Option<Value>> {
        join_all(self.responses.iter().map(|r| r.output_attr(files, attr))).await
    }

    /// Attribute values of every envelope flattened into one list.
    ///
    /// Envelopes without the attribute are skipped; a scalar value is kept
    /// as a single element.
    pub async fn concat_output_attr(&self, files: &dyn FileService, attr: &str) -> Value {
        let values = self.output_attrs(files, attr).await;
        Value::Array(
            values
                .into_iter()
                .flatten()
                .flat_map(|value| match value {
                    Value::Array(items) => items,
                    other => vec![other],
                })
                .collect(),
        )
    }
}

fn concatenate(outputs: Vec<Value>) -> Value {
    if outputs.iter().all(Value::is_array) {
        return Value::Array(
            outputs
                .into_iter()
                .flat_map(|out| match out {
                    Value::Array(items) => items,
                    other => vec![other],
                })
                .collect(),
        );
    }
    if outputs.iter().all(Value::is_object) {
        return Value::Object(concatenate_maps(outputs));
    }
    Value::Array(outputs)
}

fn concatenate_maps(outputs: Vec<Value>) -> Map<String, Value> {
    let maps: Vec<Map<String, Value>> = outputs
        .into_iter()
        .filter_map(|out| match out {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let mut keys: Vec<String> = Vec::new();
    for key in maps.iter().flat_map(|m| m.keys()) {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }

    let mut merged = Map::new();
    for key in keys {
        let values: Vec<Value> = maps
            .iter()
            .map(|m| m.get(&key).cloned().unwrap_or(Value::Null))
            .collect();
        let value = if values.iter().all(Value::is_array) {
            concatenate(values)
        } else {
            Value::Array(values)
        };
        merged.insert(key, value);
    }
    merged
}

impl From<Vec<ResponseEnvelope>> for ResponseBatch {
    fn from(responses: Vec<ResponseEnvelope>) -> Self {
        Self { responses }
    }
}

impl FromIterator<ResponseEnvelope> for ResponseBatch {
    fn from_iter<I: IntoIterator<Item = ResponseEnvelope>>(iter: I) -> Self {
        Self {
            responses: iter.into_iter().collect(),
        }
    }
}

impl Extend<ResponseEnvelope> for ResponseBatch {
    fn extend<I: IntoIterator<Item = ResponseEnvelope>>(&mut self, iter: I) {
        self.responses.extend(iter);
    }
}

impl IntoIterator for ResponseBatch {
    type Item = ResponseEnvelope;
    type IntoIter = std::vec::IntoIter<ResponseEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResponseBatch {
    type Item = &'a ResponseEnvelope;
    type IntoIter = std::slice::Iter<'a, ResponseEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

impl std::ops::Index<usize> for ResponseBatch {
    type Output = ResponseEnvelope;

    fn index(&self, index: usize) -> &Self::Output {
        &self.responses[index]
    }
}

impl std::ops::Add for ResponseBatch {
    type Output = ResponseBatch;

    fn add(mut self, other: ResponseBatch) -> Self::Output {
        self.responses.extend(other.responses);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::file_service::mocks::MockFileService;
    use serde_json::json;

    fn done(data: Value) -> ResponseEnvelope {
        ResponseEnvelope::new(json!({ "response": { "task_1": { "status": "done", "data": data } } }))
            .unwrap()
    }

    fn queued(output_file: &str) -> ResponseEnvelope {
        ResponseEnvelope::new(json!({
            "response": { "task_1": { "task": { "output_file": output_file } } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_read_output_data_keeps_order() {
        let files = MockFileService::new()
            .with_file("a.csv", json!(["a"]))
            .with_file("c.csv", json!(["c"]));
        let batch: ResponseBatch = vec![queued("a.csv"), queued("b.csv"), queued("c.csv")].into();

        let outputs = batch.read_output_data(&files).await;
        assert_eq!(outputs, vec![Some(json!(["a"])), None, Some(json!(["c"]))]);
        assert_eq!(files.check_calls(), 3);
        assert_eq!(files.read_calls(), 2);
    }

    #[tokio::test]
    async fn test_concat_lists() {
        let files = MockFileService::new();
        let batch: ResponseBatch = vec![done(json!([1, 2])), queued("x.csv"), done(json!([3]))]
            .into_iter()
            .collect();

        assert_eq!(batch.concat_output(&files).await, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_concat_maps() {
        let files = MockFileService::new();
        let batch = ResponseBatch::from(vec![
            done(json!({ "doc": ["a"], "year": 2020 })),
            done(json!({ "doc": ["b", "c"], "year": 2021 })),
        ]);

        assert_eq!(
            batch.concat_output(&files).await,
            json!({ "doc": ["a", "b", "c"], "year": [2020, 2021] })
        );
    }

    #[tokio::test]
    async fn test_output_attrs_per_envelope_and_flattened() {
        let files = MockFileService::new().with_file(
            "rows.csv",
            json!([{ "doc": "c", "page": 1 }, { "doc": "c", "page": 2 }, { "doc": "d", "page": 1 }]),
        );
        let batch = ResponseBatch::from(vec![
            done(json!([{ "doc": "a" }, { "doc": "b" }])),
            done(json!({ "doc": "e" })),
            done(json!("no attributes")),
            queued("rows.csv"),
            queued("missing.csv"),
        ]);

        assert_eq!(
            batch.output_attrs(&files, "doc").await,
            vec![
                Some(json!(["a", "b"])),
                Some(json!("e")),
                None,
                Some(json!(["c", "d"])),
                None,
            ]
        );
        assert_eq!(
            batch.concat_output_attr(&files, "doc").await,
            json!(["a", "b", "e", "c", "d"])
        );
    }

    #[test]
    fn test_add_and_index() {
        let mut left = ResponseBatch::new();
        left.push(done(json!(1)));
        let mut right = ResponseBatch::new();
        right.extend(vec![done(json!(2)), done(json!(3))]);

        let joined = left + right;
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[2].data(), Some(&json!(3)));
        assert!(joined.get(3).is_none());
    }
}
