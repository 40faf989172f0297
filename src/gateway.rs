//! Edge verification and propagated identity.
//!
//! Only [`authenticate`] writes the `user_id` / `user_type` headers, after it
//! has verified an access token. [`strip_identity_headers`] runs on every
//! inbound request so a client can never supply them itself. Downstream
//! handlers take [`PropagatedIdentity`] as an extractor and do not look at
//! tokens at all.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{
    auth::claims::{Claims, UserType},
    error::ApiError,
    state::AppState,
};

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("user_id");
pub const USER_TYPE_HEADER: HeaderName = HeaderName::from_static("user_type");
pub const REFRESH_AUTHORIZATION: HeaderName = HeaderName::from_static("refresh-authorization");

/// Identity asserted to downstream services after edge verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagatedIdentity {
    pub user_id: i64,
    pub user_type: UserType,
}

impl From<&Claims> for PropagatedIdentity {
    fn from(c: &Claims) -> Self {
        Self {
            user_id: c.sub,
            user_type: c.user_type,
        }
    }
}

impl PropagatedIdentity {
    /// Sets both headers, replacing whatever was there.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(USER_ID_HEADER, HeaderValue::from(self.user_id));
        headers.insert(
            USER_TYPE_HEADER,
            HeaderValue::from_static(self.user_type.as_str()),
        );
    }

    /// `Forbidden(message)` unless the caller is `owner_id`.
    pub fn require_owner(&self, owner_id: i64, message: &'static str) -> Result<(), ApiError> {
        if self.user_id != owner_id {
            warn!(user_id = self.user_id, owner_id, "not the owner");
            return Err(ApiError::Forbidden(message));
        }
        Ok(())
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers
            .get(USER_ID_HEADER)?
            .to_str()
            .ok()?
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)?;
        let user_type = headers
            .get(USER_TYPE_HEADER)?
            .to_str()
            .ok()?
            .parse::<UserType>()
            .ok()?;
        Some(Self { user_id, user_type })
    }
}

/// Returns the token of a `Bearer <token>` header value.
pub fn bearer_token<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn bearer_value(token: &str) -> anyhow::Result<HeaderValue> {
    Ok(HeaderValue::from_str(&format!("Bearer {token}"))?)
}

/// Removes client-supplied identity headers from every request.
pub async fn strip_identity_headers(mut req: Request, next: Next) -> Response {
    let spoofed = req.headers().contains_key(USER_ID_HEADER)
        || req.headers().contains_key(USER_TYPE_HEADER);
    if spoofed {
        warn!(uri = %req.uri(), "client supplied identity headers; dropped");
        let headers = req.headers_mut();
        headers.remove(USER_ID_HEADER);
        headers.remove(USER_TYPE_HEADER);
    }
    next.run(req).await
}

/// Edge verification: requires a valid access token and forwards the
/// identity it carries. Every failure gets the same 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(req.headers(), &AUTHORIZATION) else {
        warn!(uri = %req.uri(), "missing or malformed Authorization header");
        return Err(ApiError::Unauthenticated);
    };

    let claims = state.keys.verify_access(token).map_err(|e| {
        warn!(reason = %e, "edge token verification failed");
        ApiError::Unauthenticated
    })?;

    let identity = PropagatedIdentity::from(&claims);
    identity.apply(req.headers_mut());
    req.extensions_mut().insert(identity);
    debug!(user_id = identity.user_id, user_type = %identity.user_type, "identity propagated");

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for PropagatedIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        PropagatedIdentity::from_headers(&parts.headers).ok_or_else(|| {
            warn!(uri = %parts.uri, "request reached a protected handler without identity");
            ApiError::Unauthenticated
        })
    }
}
