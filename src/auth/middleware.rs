use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::AuthContext;
use crate::app::AppState;
use crate::error::ErrorResponse;
use crate::middleware::request_id::RequestIdExt;

/// Extractor that requires a valid Supabase JWT.
///
/// ```ignore
/// async fn list_inspections(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, technician {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl AuthError {
    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidFormat => "Invalid authorization format",
            AuthError::InvalidToken => "Invalid or expired token",
        }
    }

    fn into_response_with_id(self, request_id: Option<String>) -> Response {
        let body = ErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            message: self.message().to_string(),
            request_id,
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_response_with_id(None)
    }
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts.headers.request_id().map(str::to_string);
        let reject = |err: AuthError| err.into_response_with_id(request_id.clone());

        let token = bearer_token(&parts.headers).map_err(reject)?;

        let claims = state.jwks_cache.verify_token(token).await.map_err(|e| {
            tracing::warn!(error = %e, request_id = ?request_id, "JWT verification failed");
            reject(AuthError::InvalidToken)
        })?;

        let context = AuthContext::from_claims(&claims).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build auth context");
            reject(AuthError::InvalidToken)
        })?;

        Ok(RequireAuth(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("Basic Zm9v")), Err(AuthError::InvalidFormat));
        assert_eq!(bearer_token(&headers("Bearer  ")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
    }

    #[test]
    fn rejection_is_unauthorized() {
        let response = AuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
