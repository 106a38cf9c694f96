use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::database::store::Document;
use crate::error::ApiError;

/// Success half of an operation outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Document(Document),
    Documents(Vec<Document>),
    /// Rendered as an empty JSON string
    Empty(&'static str),
}

impl Payload {
    pub fn empty() -> Self {
        Payload::Empty("")
    }
}

/// Result of every CRUD operation: exactly one of payload or failure
pub type Outcome = Result<Payload, ApiError>;

/// Successful payloads are sent bare with the default 200 status
impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn payloads_serialize_bare() {
        let doc = json!({ "name": "x" }).as_object().cloned().unwrap();
        let value = |payload: Payload| serde_json::to_value(payload).unwrap();
        assert_eq!(value(Payload::Document(doc.clone())), json!({ "name": "x" }));
        assert_eq!(value(Payload::Documents(vec![doc])), json!([{ "name": "x" }]));
        assert_eq!(value(Payload::Documents(vec![])), json!([]));
        assert_eq!(value(Payload::empty()), json!(""));
    }

    #[test]
    fn outcome_renders_status() {
        let ok: Outcome = Ok(Payload::Documents(vec![]));
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let failed: Outcome = Err(ApiError::bad_request(""));
        assert_eq!(failed.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
