use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Per-request hints passed to the bulk engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Restricts execution to the partition holding this key value. Only a
    /// performance hint: results must not depend on it.
    pub partition_key: Option<String>,
}

impl RequestOptions {
    pub fn for_partition(value: impl Into<String>) -> Self {
        Self {
            partition_key: Some(value.into()),
        }
    }
}

/// Equality predicate on a top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Selects the records a bulk delete removes. `None` selects everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub filter: Option<FieldFilter>,
}

impl DeleteQuery {
    pub fn all() -> Self {
        Self { filter: None }
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(FieldFilter {
                field: field.into(),
                value: value.into(),
            }),
        }
    }

    pub fn matches(&self, body: &Map<String, Value>) -> bool {
        match &self.filter {
            None => true,
            Some(filter) => body.get(&filter.field) == Some(&filter.value),
        }
    }
}

impl fmt::Display for DeleteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            None => f.write_str("select * from c"),
            Some(filter) => write!(f, "select * from c where c.{} = {}", filter.field, filter.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_and_matches() {
        let query = DeleteQuery::field_equals("partitionKey", "2");
        assert_eq!(
            query.to_string(),
            r#"select * from c where c.partitionKey = "2""#
        );

        let Value::Object(hit) = json!({"id": "2", "partitionKey": "2"}) else {
            unreachable!()
        };
        let Value::Object(miss) = json!({"id": "3", "partitionKey": "3"}) else {
            unreachable!()
        };
        assert!(query.matches(&hit));
        assert!(!query.matches(&miss));
        assert!(DeleteQuery::all().matches(&miss));
    }
}
