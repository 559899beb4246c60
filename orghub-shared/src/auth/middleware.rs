/// Bearer token authentication for Axum
///
/// [`authenticate`] turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`]. The API's auth layer calls it and inserts the context into
/// request extensions, so handlers read it with `Extension<AuthContext>`.
///
/// # Failure codes
///
/// | Condition                         | Code                  |
/// |-----------------------------------|-----------------------|
/// | No `Authorization` header         | `MISSING_AUTH_HEADER` |
/// | Header not `Bearer <token>`       | `INVALID_AUTH_FORMAT` |
/// | `Bearer` with an empty token      | `MISSING_TOKEN`       |
/// | Token fails validation            | `INVALID_TOKEN`       |
///
/// The API maps all of them to 401 Unauthorized.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use orghub_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {} <{}>", auth.user_id, auth.email)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::validate_token;
use crate::models::membership::MembershipRole;

/// Organization the request is scoped to, once membership is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationContext {
    pub organization_id: Uuid,
    pub role: MembershipRole,
}

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,

    /// Set by organization authorization, never by the token itself
    pub organization: Option<OrganizationContext>,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: String) -> Self {
        Self {
            user_id,
            email,
            organization: None,
        }
    }

    /// Returns a copy scoped to `organization_id` with `role`
    pub fn with_organization(&self, organization_id: Uuid, role: MembershipRole) -> Self {
        Self {
            organization: Some(OrganizationContext {
                organization_id,
                role,
            }),
            ..self.clone()
        }
    }
}

/// Error type for bearer authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingAuthHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    InvalidAuthFormat,

    #[error("Bearer token is empty")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,
}

impl AuthError {
    /// Machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AuthError::InvalidAuthFormat => "INVALID_AUTH_FORMAT",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
        }
    }
}

/// Extracts and validates the bearer token from request headers
///
/// A header value that is not valid visible ASCII counts as a malformed
/// header. Surrounding whitespace around the token is ignored.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthFormat)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| (value.trim_end() == "Bearer").then_some(""))
        .ok_or(AuthError::InvalidAuthFormat)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let claims = validate_token(token, secret).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthContext::new(claims.sub, claims.email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        let err = authenticate(&HeaderMap::new(), SECRET).unwrap_err();
        assert_eq!(err, AuthError::MissingAuthHeader);
        assert_eq!(err.code(), "MISSING_AUTH_HEADER");
    }

    #[test]
    fn test_wrong_scheme() {
        for value in ["Basic dXNlcjpwYXNz", "bearer abc", "Token abc", "Bearerabc"] {
            let err = authenticate(&headers(value), SECRET).unwrap_err();
            assert_eq!(err, AuthError::InvalidAuthFormat, "value {:?}", value);
        }
    }

    #[test]
    fn test_empty_token() {
        for value in ["Bearer ", "Bearer    ", "Bearer"] {
            let err = authenticate(&headers(value), SECRET).unwrap_err();
            assert_eq!(err, AuthError::MissingToken, "value {:?}", value);
        }
    }

    #[test]
    fn test_invalid_token() {
        let err = authenticate(&headers("Bearer garbage"), SECRET).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "a@example.com".to_string()), SECRET).unwrap();

        let context = authenticate(&headers(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.email, "a@example.com");
        assert!(context.organization.is_none());
    }

    #[test]
    fn test_with_organization() {
        let context = AuthContext::new(Uuid::new_v4(), "a@example.com".to_string());
        let org_id = Uuid::new_v4();

        let scoped = context.with_organization(org_id, MembershipRole::Admin);
        let org = scoped.organization.unwrap();
        assert_eq!(org.organization_id, org_id);
        assert_eq!(org.role, MembershipRole::Admin);
        assert_eq!(scoped.user_id, context.user_id);
    }
}
