//! Request extractors

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use platform::client::{ClientFingerprint, extract_client_ip, extract_fingerprint};
use std::net::SocketAddr;

use crate::application::check_session::CurrentUser;
use crate::error::{AuthError, AuthResult};

/// Fingerprint of the calling client
///
/// Works with or without `ConnectInfo` (absent in router tests).
pub struct RequestFingerprint(pub ClientFingerprint);

pub fn request_fingerprint(
    headers: &HeaderMap,
    extensions: &Extensions,
) -> AuthResult<ClientFingerprint> {
    let direct_ip = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(headers, direct_ip);

    Ok(extract_fingerprint(headers, client_ip)?)
}

impl<S> FromRequestParts<S> for RequestFingerprint
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_fingerprint(&parts.headers, &parts.extensions).map(Self)
    }
}

/// Inserted by `require_auth_session`
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::SessionInvalid)
    }
}
