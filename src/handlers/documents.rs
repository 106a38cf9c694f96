use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Extension, Path, RawQuery, State,
    },
    routing::get,
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::store::Document;
use crate::error::ApiError;
use crate::filter;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::Outcome;
use crate::services::Translator;

type TranslatorState = State<Arc<dyn Translator>>;
type IdPath = Result<Path<String>, PathRejection>;
type RawBody = Result<Bytes, BytesRejection>;

/// The six document routes, relative to their mount point:
///
/// | Method | Path   | Operation |
/// |--------|--------|-----------|
/// | GET    | `/`    | query     |
/// | GET    | `/:id` | get       |
/// | PUT    | `/`    | create    |
/// | POST   | `/`    | create    |
/// | POST   | `/:id` | update    |
/// | DELETE | `/:id` | remove    |
pub fn routes(translator: Arc<dyn Translator>) -> Router {
    Router::new()
        .route("/", get(query).put(create).post(create))
        .route("/:id", get(get_one).post(update).delete(remove))
        .with_state(translator)
}

/// GET / - list documents, filtered by query-string equality
pub async fn query(
    State(translator): TranslatorState,
    user: Option<Extension<AuthUser>>,
    RawQuery(raw): RawQuery,
) -> Outcome {
    let tenant = require_tenant(user)?;
    let params = query_params(raw.as_deref());
    let (criteria, options) = filter::from_query(&params)?;
    translator.query(&tenant, criteria, options).await
}

/// GET /:id - fetch one document
pub async fn get_one(
    State(translator): TranslatorState,
    user: Option<Extension<AuthUser>>,
    id: IdPath,
) -> Outcome {
    let tenant = require_tenant(user)?;
    let criteria = require_id(&id?.0)?;
    translator.get(&tenant, criteria).await
}

/// PUT / and POST / - insert one document
pub async fn create(
    State(translator): TranslatorState,
    user: Option<Extension<AuthUser>>,
    body: RawBody,
) -> Outcome {
    let tenant = require_tenant(user)?;
    let document = require_body(&body?)?;
    translator.create(&tenant, document).await
}

/// POST /:id - replace one document's body
pub async fn update(
    State(translator): TranslatorState,
    user: Option<Extension<AuthUser>>,
    id: IdPath,
    body: RawBody,
) -> Outcome {
    let tenant = require_tenant(user)?;
    let criteria = require_id(&id?.0)?;
    let document = require_body(&body?)?;
    translator.update(&tenant, criteria, document, None).await
}

/// DELETE /:id - delete one document
pub async fn remove(
    State(translator): TranslatorState,
    user: Option<Extension<AuthUser>>,
    id: IdPath,
) -> Outcome {
    let tenant = require_tenant(user)?;
    let criteria = require_id(&id?.0)?;
    translator.remove(&tenant, criteria).await
}

fn require_tenant(user: Option<Extension<AuthUser>>) -> Result<String, ApiError> {
    user.as_ref()
        .and_then(|Extension(user)| user.bucket())
        .map(str::to_string)
        .ok_or_else(ApiError::unauthorized)
}

fn require_id(id: &str) -> Result<Document, ApiError> {
    if id.is_empty() {
        return Err(ApiError::bad_request("id missing"));
    }
    Ok(filter::id_criteria(id)?)
}

fn require_body(body: &[u8]) -> Result<Document, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("body missing"));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(Value::Null) => Err(ApiError::bad_request("body missing")),
        Ok(_) => Err(ApiError::bad_request("body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {}", e))),
    }
}

fn query_params(raw: Option<&str>) -> HashMap<String, String> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_must_be_a_json_object() {
        assert_eq!(require_body(b"").unwrap_err(), ApiError::bad_request("body missing"));
        assert_eq!(require_body(b"  \n").unwrap_err(), ApiError::bad_request("body missing"));
        assert_eq!(require_body(b"null").unwrap_err(), ApiError::bad_request("body missing"));
        assert_eq!(require_body(b"[1]").unwrap_err().status_code(), 400);
        assert_eq!(require_body(b"{oops").unwrap_err().status_code(), 400);
        assert_eq!(require_body(br#"{"name":"x"}"#).unwrap()["name"], "x");
    }

    #[test]
    fn ids_must_be_present_and_well_formed() {
        assert_eq!(require_id("").unwrap_err(), ApiError::bad_request("id missing"));
        assert_eq!(require_id("abc123").unwrap_err().status_code(), 400);
        assert!(require_id(&uuid::Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn anonymous_requests_are_unauthorized() {
        assert_eq!(require_tenant(None).unwrap_err(), ApiError::unauthorized());
    }

    #[test]
    fn parses_raw_query_strings() {
        let params = query_params(Some("name=a%20b&limit=2"));
        assert_eq!(params.get("name").map(String::as_str), Some("a b"));
        assert_eq!(params.get("limit").map(String::as_str), Some("2"));
        assert!(query_params(None).is_empty());
    }
}
