use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{verify_token, Claims};

/// Query parameter that may carry the bearer token
pub const TOKEN_PARAM: &str = "token";

/// Authenticated user context extracted from a verified token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    /// Non-empty tenant identity, if any
    pub fn bucket(&self) -> Option<&str> {
        self.claims.tenant()
    }
}

/// Resolves bearer credentials to claims. Never rejects a request.
#[derive(Clone)]
pub struct Authenticator {
    private_key: Arc<str>,
}

impl Authenticator {
    pub fn new(private_key: impl Into<Arc<str>>) -> Self {
        Self {
            private_key: private_key.into(),
        }
    }

    /// Resolve the claims for a request, or `None` when it carries no valid token
    pub fn resolve(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Option<Claims> {
        if is_auth_preflight(method, headers) {
            tracing::debug!("Skipping authentication for CORS preflight");
            return None;
        }

        let token = extract_token_from_query(uri).or_else(|| extract_token_from_headers(headers))?;

        match verify_token(&token, &self.private_key) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Token rejected: {}", e);
                None
            }
        }
    }
}

/// Authentication middleware: attaches `AuthUser` when the token verifies, otherwise
/// passes the request through untouched. Route handlers decide what anonymous means.
pub async fn resolve_authentication(
    State(authenticator): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = authenticator.resolve(request.method(), request.uri(), request.headers());

    if let Some(claims) = claims {
        request.extensions_mut().insert(AuthUser { claims });
    }

    next.run(request).await
}

/// OPTIONS requests announcing they will send an `authorization` header
fn is_auth_preflight(method: &Method, headers: &HeaderMap) -> bool {
    if method != Method::OPTIONS {
        return false;
    }

    headers
        .get_all(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|h| h.trim().eq_ignore_ascii_case("authorization"))
}

/// Extract token from the `token` query parameter
fn extract_token_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

/// Extract token from an `Authorization: Bearer <token>` header.
///
/// The header must be exactly two space-separated parts with a
/// case-insensitive `Bearer` scheme.
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let parts: Vec<&str> = auth_str.split(' ').collect();
    match parts.as_slice() {
        [scheme, credentials] if scheme.eq_ignore_ascii_case("bearer") && !credentials.is_empty() => {
            Some(credentials.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_token;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    fn token(bucket: &str) -> String {
        generate_token(&Claims::new(bucket, 1), SECRET).unwrap()
    }

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn resolve(method: Method, uri: &str, headers: &HeaderMap) -> Option<Claims> {
        let uri: Uri = uri.parse().unwrap();
        Authenticator::new(SECRET).resolve(&method, &uri, headers)
    }

    #[test]
    fn bearer_header_resolves_claims() {
        let h = headers(&[(header::AUTHORIZATION, &format!("Bearer {}", token("acme")))]);
        let claims = resolve(Method::GET, "/", &h).unwrap();
        assert_eq!(claims.bucket, "acme");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let h = headers(&[(header::AUTHORIZATION, &format!("bEaReR {}", token("acme")))]);
        assert!(resolve(Method::GET, "/", &h).is_some());
    }

    #[test]
    fn malformed_headers_yield_nothing() {
        let t = token("acme");
        for value in [
            format!("Bearer {} extra", t),
            format!("Bearer  {}", t),
            format!("Basic {}", t),
            t.clone(),
        ] {
            let h = headers(&[(header::AUTHORIZATION, &value)]);
            assert!(resolve(Method::GET, "/", &h).is_none(), "accepted {:?}", value);
        }
    }

    #[test]
    fn query_token_takes_precedence() {
        let h = headers(&[(header::AUTHORIZATION, &format!("Bearer {}", token("header")))]);
        let uri = format!("/?token={}", token("query"));
        assert_eq!(resolve(Method::GET, &uri, &h).unwrap().bucket, "query");
    }

    #[test]
    fn invalid_tokens_yield_nothing() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer garbage")]);
        assert!(resolve(Method::GET, "/", &h).is_none());
        assert!(resolve(Method::GET, "/?token=garbage", &HeaderMap::new()).is_none());
        assert!(resolve(Method::GET, "/", &HeaderMap::new()).is_none());
    }

    #[test]
    fn auth_preflight_is_skipped() {
        let h = headers(&[
            (header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type, Authorization"),
            (header::AUTHORIZATION, &format!("Bearer {}", token("acme"))),
        ]);
        assert!(resolve(Method::OPTIONS, "/", &h).is_none());
        assert!(is_auth_preflight(&Method::OPTIONS, &h));
        assert!(!is_auth_preflight(&Method::GET, &h));

        let plain = headers(&[(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")]);
        assert!(!is_auth_preflight(&Method::OPTIONS, &plain));
    }
}
