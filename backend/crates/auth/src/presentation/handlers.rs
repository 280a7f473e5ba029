//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use platform::clock::Clock;
use std::sync::Arc;

use crate::application::check_session::CurrentUser;
use crate::application::config::{
    AuthConfig, PASSWORD_RESET, RESET_LINK_SENT, VERIFICATION_LINK_SENT,
};
use crate::application::{
    EmailVerificationUseCase, PasswordResetUseCase, ResendOutcome, ResetPasswordInput,
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::event::EventPublisher;
use crate::domain::notifier::VerificationNotifier;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::signed_url::SignedLinkParams;
use crate::error::AuthResult;
use crate::presentation::dto::{
    DashboardResponse, ForgotPasswordRequest, LoginRequest, PromptQuery, RegisterRequest,
    ResetPasswordRequest, StatusResponse, UserResponse, VerificationPromptResponse,
    VerifyEmailQuery,
};
use crate::presentation::extract::RequestFingerprint;

/// Store backing every handler
pub trait AuthStore: UserRepository + AuthSessionRepository + Send + Sync + 'static {}

impl<T> AuthStore for T where T: UserRepository + AuthSessionRepository + Send + Sync + 'static {}

/// Verification link transport
pub trait LinkNotifier: VerificationNotifier + Send + Sync + 'static {}

impl<T> LinkNotifier for T where T: VerificationNotifier + Send + Sync + 'static {}

/// Domain event sink
pub trait EventSink: EventPublisher + Send + Sync + 'static {}

impl<T> EventSink for T where T: EventPublisher + Send + Sync + 'static {}

/// Shared state for auth handlers
pub struct AuthAppState<R, N, E> {
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub events: Arc<E>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AuthConfig>,
}

// Manual impl: only the Arcs are cloned.
impl<R, N, E> Clone for AuthAppState<R, N, E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            events: self.events.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, N, E> AuthAppState<R, N, E>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    fn email_verification(&self) -> EmailVerificationUseCase<R, N, E> {
        EmailVerificationUseCase::new(
            self.repo.clone(),
            self.notifier.clone(),
            self.events.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    fn sign_in(&self) -> SignInUseCase<R, R> {
        SignInUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    fn password_reset(&self) -> PasswordResetUseCase<R, R, N, E> {
        PasswordResetUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.notifier.clone(),
            self.events.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    fn session_cookie(&self, token: &str, remember_me: bool) -> String {
        self.config
            .session_cookie()
            .build_set_cookie(token, self.config.session_ttl(remember_me).as_secs())
    }
}

// ============================================================================
// Register / Login / Logout
// ============================================================================

/// POST /register
pub async fn register<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.events.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let token = state
        .sign_in()
        .start_session(&output.user, false, &fingerprint)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, state.session_cookie(&token, false))],
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /login
pub async fn login<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    RequestFingerprint(fingerprint): RequestFingerprint,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let remember_me = req.remember_me;

    let output = state
        .sign_in()
        .execute(
            SignInInput {
                email: req.email,
                password: req.password,
                remember_me,
            },
            &fingerprint,
        )
        .await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.session_cookie(&output.session_token, remember_me))],
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /logout
pub async fn logout<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    if let Some(token) = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign out without a valid session");
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.config.session_cookie().build_delete_cookie())],
    )
}

// ============================================================================
// Email Verification
// ============================================================================

/// GET /verify-email
pub async fn verification_prompt<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    current: CurrentUser,
    Query(query): Query<PromptQuery>,
) -> Response
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    if current.user.has_verified_email() {
        return Redirect::to(&state.config.landing_path).into_response();
    }

    Json(VerificationPromptResponse {
        email: current.user.email.to_string(),
        email_verified: false,
        status: query.status.filter(|s| s == VERIFICATION_LINK_SENT),
    })
    .into_response()
}

/// GET /verify-email/{id}/{hash}?expires=..&signature=..
pub async fn verify_email<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    current: CurrentUser,
    Path((id, hash)): Path<(String, String)>,
    Query(query): Query<VerifyEmailQuery>,
) -> AuthResult<Redirect>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let params = SignedLinkParams {
        id,
        hash,
        expires: query.expires,
        signature: query.signature,
    };

    state
        .email_verification()
        .verify(&params, &current.user)
        .await?;

    Ok(Redirect::to(&state.config.verified_redirect()))
}

/// POST /email/verification-notification
pub async fn resend_verification<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    current: CurrentUser,
) -> AuthResult<Redirect>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let target = match state.email_verification().resend(&current.user).await? {
        ResendOutcome::AlreadyVerified => state.config.landing_path.clone(),
        ResendOutcome::LinkSent => state.config.link_sent_redirect(),
    };

    Ok(Redirect::to(&target))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /forgot-password
///
/// Same answer whether or not the email belongs to an account.
pub async fn forgot_password<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    state.password_reset().request(req.email).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: RESET_LINK_SENT,
        }),
    ))
}

/// POST /reset-password
pub async fn reset_password<R, N, E>(
    State(state): State<AuthAppState<R, N, E>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let input = ResetPasswordInput {
        link: SignedLinkParams {
            id: req.id,
            hash: req.hash,
            expires: req.expires,
            signature: req.signature,
        },
        password: req.password,
    };

    state.password_reset().reset(input).await?;

    // Every session was ended; drop this browser's cookie too
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.config.session_cookie().build_delete_cookie())],
        Json(StatusResponse {
            status: PASSWORD_RESET,
        }),
    ))
}

// ============================================================================
// Landing page (verified users only)
// ============================================================================

/// GET /dashboard
pub async fn dashboard(current: CurrentUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        user_id: current.user.user_id.to_string(),
        email: current.user.email.to_string(),
        email_verified_at: current.user.email_verified_at,
    })
}
