//! Auth Middleware
//!
//! - `require_auth_session`: resolves the session cookie to a [`CurrentUser`]
//! - `require_verified_email`: sends unverified users to the prompt

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use platform::client::ClientFingerprint;

use crate::application::CheckSessionUseCase;
use crate::application::check_session::CurrentUser;
use crate::domain::signed_url::VERIFY_EMAIL_PATH;
use crate::error::{AuthError, AuthResult};
use crate::presentation::extract::request_fingerprint;
use crate::presentation::handlers::{AuthAppState, AuthStore, EventSink, LinkNotifier};

/// Middleware that requires a valid auth session
pub async fn require_auth_session<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let credentials = session_credentials(&state, &req);
    let result = match credentials {
        Ok((token, fingerprint)) => authenticate(&state, &token, &fingerprint).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(current) => {
            req.extensions_mut().insert(current);
            Ok(next.run(req).await)
        }
        Err(e @ (AuthError::Database(_) | AuthError::Internal(_) | AuthError::MissingHeader(_))) => {
            Err(e.into_response())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Authentication required");
            let mut response = AuthError::SessionInvalid.into_response();
            response
                .headers_mut()
                .insert("X-Auth-Required", HeaderValue::from_static("true"));
            Err(response)
        }
    }
}

/// Cookie token and fingerprint, read before any `.await` (`Body` is not `Sync`)
fn session_credentials<R, N, E>(
    state: &AuthAppState<R, N, E>,
    req: &Request<Body>,
) -> AuthResult<(String, ClientFingerprint)> {
    let fingerprint = request_fingerprint(req.headers(), req.extensions())?;
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name)
        .ok_or(AuthError::SessionInvalid)?;
    Ok((token, fingerprint))
}

async fn authenticate<R, N, E>(
    state: &AuthAppState<R, N, E>,
    token: &str,
    fingerprint: &ClientFingerprint,
) -> AuthResult<CurrentUser>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    CheckSessionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.clock.clone(),
        state.config.clone(),
    )
    .execute(token, &fingerprint.hash)
    .await
}

/// Middleware that only lets verified users through
///
/// Must run inside `require_auth_session`.
pub async fn require_verified_email(
    current: CurrentUser,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !current.user.has_verified_email() {
        return Redirect::to(VERIFY_EMAIL_PATH).into_response();
    }

    next.run(req).await
}
