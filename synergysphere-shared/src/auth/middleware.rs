/// Authentication context for Axum handlers
///
/// This module provides the authentication context injected into request
/// extensions by the API server's JWT middleware, plus helpers for extracting
/// bearer credentials from requests.
///
/// # Request Extensions
///
/// After successful authentication, the middleware adds:
/// - `AuthContext`: Contains the authenticated user's id
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use synergysphere_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication context added to request extensions
///
/// Handlers extract it using Axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Extracts a bearer token from the `Authorization` header
///
/// Returns `None` if the header is missing or not a `Bearer` credential.
///
/// # Example
///
/// ```
/// use axum::http::{HeaderMap, HeaderValue};
/// use synergysphere_shared::auth::middleware::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
/// assert_eq!(bearer_token(&headers), Some("abc123"));
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
