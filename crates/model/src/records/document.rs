use serde_json::{Map, Value};

/// A single record to be written, identified by `id` within its
/// partition-key value.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub partition_key: String,
    pub body: Map<String, Value>,
}

impl Document {
    /// Creates a document whose body already carries `id` and the
    /// partition-key field.
    pub fn new(
        id: impl Into<String>,
        partition_key_field: &str,
        partition_key: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let partition_key = partition_key.into();

        let mut body = Map::new();
        body.insert("id".to_string(), Value::String(id.clone()));
        body.insert(
            partition_key_field.to_string(),
            Value::String(partition_key.clone()),
        );

        Self {
            id,
            partition_key,
            body,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.body)
    }

    /// Serialized size of the body in bytes.
    pub fn size_bytes(&self) -> usize {
        self.to_bytes().map(|b| b.len()).unwrap_or(0)
    }
}
