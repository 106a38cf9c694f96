pub mod error;

use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::store::{Document, FindOptions, ID_FIELD};
pub use error::FilterError;

/// Query-string keys that are never treated as criteria
const RESERVED_PARAMS: &[&str] = &["token", "limit", "skip"];

/// JSON containment: every field of `criteria` must be present in `document`
/// with a matching value. Same semantics as the Postgres `@>` operator.
pub fn matches(document: &Document, criteria: &Document) -> bool {
    criteria.iter().all(|(key, expected)| {
        document
            .get(key)
            .is_some_and(|actual| contains(actual, expected))
    })
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => matches(actual, expected),
        (Value::Array(actual), Value::Array(expected)) => expected
            .iter()
            .all(|e| actual.iter().any(|a| contains(a, e))),
        _ => actual == expected,
    }
}

/// Criteria selecting a document by its path identifier
pub fn id_criteria(id: &str) -> Result<Document, FilterError> {
    let id = Uuid::parse_str(id).map_err(|_| FilterError::InvalidId(id.to_string()))?;
    let mut criteria = Map::new();
    criteria.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok(criteria)
}

/// Split query-string parameters into equality criteria and find options
pub fn from_query(params: &HashMap<String, String>) -> Result<(Document, FindOptions), FilterError> {
    let mut options = FindOptions::default();

    if let Some(limit) = params.get("limit") {
        let limit: i64 = limit
            .parse()
            .map_err(|_| FilterError::InvalidLimit(limit.clone()))?;
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        options.limit = Some(limit);
    }

    if let Some(skip) = params.get("skip") {
        let skip: i64 = skip
            .parse()
            .map_err(|_| FilterError::InvalidSkip(skip.clone()))?;
        if skip < 0 {
            return Err(FilterError::InvalidSkip("Skip must be non-negative".to_string()));
        }
        options.skip = Some(skip);
    }

    let criteria = params
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    Ok((criteria, options))
}
