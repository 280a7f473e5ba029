//! Auth Router
//!
//! | Route | Gate |
//! |---|---|
//! | `POST /register`, `POST /login`, `POST /logout` | none |
//! | `POST /forgot-password`, `POST /reset-password` | none (signed link) |
//! | `GET /verify-email`, `GET /verify-email/{id}/{hash}`, `POST /email/verification-notification` | session |
//! | `GET /dashboard` | session + verified email |

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::clock::{Clock, SystemClock};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::infra::events::EventBus;
use crate::infra::mail::LogMailer;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState, AuthStore, EventSink, LinkNotifier};
use crate::presentation::middleware::{require_auth_session, require_verified_email};

/// Create the Auth router with PostgreSQL storage and log delivery
pub fn auth_router(repo: PgAuthRepository, events: EventBus, config: AuthConfig) -> Router {
    auth_router_generic(repo, LogMailer, events, Arc::new(SystemClock), config)
}

/// Create a generic Auth router for any store, transport and event sink
pub fn auth_router_generic<R, N, E>(
    repo: R,
    notifier: N,
    events: E,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
) -> Router
where
    R: AuthStore,
    N: LinkNotifier,
    E: EventSink,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(notifier),
        events: Arc::new(events),
        clock,
        config: Arc::new(config),
    };

    let verified = Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route_layer(middleware::from_fn(require_verified_email));

    let authenticated = Router::new()
        .route("/verify-email", get(handlers::verification_prompt::<R, N, E>))
        .route("/verify-email/{id}/{hash}", get(handlers::verify_email::<R, N, E>))
        .route(
            "/email/verification-notification",
            post(handlers::resend_verification::<R, N, E>),
        )
        .merge(verified)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth_session::<R, N, E>,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R, N, E>))
        .route("/login", post(handlers::login::<R, N, E>))
        .route("/logout", post(handlers::logout::<R, N, E>))
        .route("/forgot-password", post(handlers::forgot_password::<R, N, E>))
        .route("/reset-password", post(handlers::reset_password::<R, N, E>))
        .merge(authenticated)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::AuthEvent;
    use crate::domain::repository::UserRepository;
    use crate::domain::signed_url::SignedAction;
    use crate::infra::mail::OutboxMailer;
    use crate::infra::memory::InMemoryAuthRepository;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use kernel::id::UserId;
    use platform::clock::ManualClock;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    const AGENT: &str = "router-test/1.0";
    const PASSWORD: &str = "correct horse battery";

    struct TestApp {
        router: Router,
        repo: InMemoryAuthRepository,
        mailer: OutboxMailer,
        events: broadcast::Receiver<AuthEvent>,
        clock: ManualClock,
        config: AuthConfig,
    }

    fn app() -> TestApp {
        let repo = InMemoryAuthRepository::new();
        let mailer = OutboxMailer::new();
        let bus = EventBus::new();
        let events = bus.subscribe();
        let clock = ManualClock::new(Utc::now());
        let config = AuthConfig::development();

        let router = auth_router_generic(
            repo.clone(),
            mailer.clone(),
            bus,
            Arc::new(clock.clone()),
            config.clone(),
        );

        TestApp {
            router,
            repo,
            mailer,
            events,
            clock,
            config,
        }
    }

    impl TestApp {
        async fn send(&self, req: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            self.send(request("GET", uri, cookie, Body::empty())).await
        }

        async fn post(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            self.send(request("POST", uri, cookie, Body::empty())).await
        }

        /// Register and return the session cookie pair (`name=value`)
        async fn register(&self, email: &str) -> String {
            let body = serde_json::json!({ "email": email, "password": PASSWORD }).to_string();
            let res = self
                .send(json_request("POST", "/register", None, body))
                .await;
            assert_eq!(res.status(), StatusCode::CREATED);
            session_cookie(&res)
        }

        /// Path + query of the last verification link mailed to `email`
        fn last_link(&self, email: &str) -> String {
            self.last_link_for(SignedAction::VerifyEmail, email)
        }

        fn last_link_for(&self, action: SignedAction, email: &str) -> String {
            let sent = self.mailer.sent();
            let mail = sent
                .iter()
                .rev()
                .find(|m| m.to.as_str() == email && m.link.action == action)
                .expect("no mail sent");
            mail.link
                .url
                .strip_prefix(&self.config.app_url)
                .unwrap()
                .to_string()
        }

        async fn user(&self, email: &str) -> crate::domain::entity::user::User {
            self.repo
                .find_by_email(&email.parse().unwrap())
                .await
                .unwrap()
                .unwrap()
        }

        fn events_received(&mut self) -> Vec<AuthEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(body).unwrap()
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
        let mut req = request(method, uri, cookie, Body::from(body));
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        req
    }

    fn session_cookie(res: &Response<Body>) -> String {
        res.headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    fn location(res: &Response<Body>) -> &str {
        res.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn body_json(res: Response<Body>) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn verified_events(events: &[AuthEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AuthEvent::EmailVerified { .. }))
            .count()
    }

    #[tokio::test]
    async fn test_register_sends_link_and_prompt_shows_unverified() {
        let mut app = app();
        let cookie = app.register("new@example.com").await;

        assert_eq!(app.mailer.sent().len(), 1);
        assert!(
            app.events_received()
                .iter()
                .any(|e| matches!(e, AuthEvent::Registered { .. }))
        );

        let res = app.get("/verify-email", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["email"], "new@example.com");
        assert_eq!(body["emailVerified"], false);
        assert!(body.get("status").is_none());
    }

    #[tokio::test]
    async fn test_email_can_be_verified() {
        let mut app = app();
        let cookie = app.register("a@example.com").await;
        app.events_received();

        let res = app.get(&app.last_link("a@example.com"), Some(&cookie)).await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/dashboard?verified=1");
        assert!(app.user("a@example.com").await.has_verified_email());
        assert_eq!(verified_events(&app.events_received()), 1);
    }

    #[tokio::test]
    async fn test_revisiting_link_redirects_without_second_event() {
        let mut app = app();
        let cookie = app.register("a@example.com").await;
        let link = app.last_link("a@example.com");

        app.get(&link, Some(&cookie)).await;
        let verified_at = app.user("a@example.com").await.email_verified_at;
        app.events_received();

        app.clock.advance(Duration::minutes(1));
        let res = app.get(&link, Some(&cookie)).await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/dashboard?verified=1");
        assert_eq!(app.user("a@example.com").await.email_verified_at, verified_at);
        assert_eq!(verified_events(&app.events_received()), 0);
    }

    #[tokio::test]
    async fn test_email_is_not_verified_with_invalid_hash() {
        let mut app = app();
        let cookie = app.register("a@example.com").await;
        let user = app.user("a@example.com").await;
        let link = app.last_link("a@example.com");
        let query = link.split_once('?').unwrap().1;

        let wrong_hash = platform::crypto::to_hex(&platform::crypto::sha256(b"wrong-email"));
        let res = app
            .get(
                &format!("/verify-email/{}/{}?{}", user.user_id, wrong_hash, query),
                Some(&cookie),
            )
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(!app.user("a@example.com").await.has_verified_email());
        assert_eq!(verified_events(&app.events_received()), 0);
    }

    #[tokio::test]
    async fn test_expired_link_is_forbidden() {
        let app = app();
        let cookie = app.register("a@example.com").await;
        let link = app.last_link("a@example.com");

        app.clock.advance(Duration::minutes(61));
        let res = app.get(&link, Some(&cookie)).await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(!app.user("a@example.com").await.has_verified_email());
    }

    #[tokio::test]
    async fn test_link_of_another_user_is_forbidden() {
        let app = app();
        app.register("alice@example.com").await;
        let alice_link = app.last_link("alice@example.com");
        let bob_cookie = app.register("bob@example.com").await;

        let res = app.get(&alice_link, Some(&bob_cookie)).await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(!app.user("alice@example.com").await.has_verified_email());
        assert!(!app.user("bob@example.com").await.has_verified_email());
    }

    #[tokio::test]
    async fn test_all_rejections_share_one_body() {
        let app = app();
        let cookie = app.register("a@example.com").await;
        let link = app.last_link("a@example.com");
        let user = app.user("a@example.com").await;

        let tampered = format!("{}0", link);
        let foreign = link.replace(&user.user_id.to_string(), &UserId::new().to_string());
        let unsigned = link.split_once('?').unwrap().0.to_string();

        let mut bodies = Vec::new();
        for uri in [tampered, foreign, unsigned] {
            let res = app.get(&uri, Some(&cookie)).await;
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{uri}");
            bodies.push(body_json(res).await);
        }

        app.clock.advance(Duration::hours(2));
        let res = app.get(&link, Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        bodies.push(body_json(res).await);

        for body in &bodies {
            assert_eq!(body, &bodies[0]);
        }
        assert_eq!(bodies[0]["detail"], "This action is unauthorized.");
    }

    #[tokio::test]
    async fn test_resend_for_unverified_user() {
        let app = app();
        let cookie = app.register("a@example.com").await;

        let res = app
            .post("/email/verification-notification", Some(&cookie))
            .await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/verify-email?status=verification-link-sent");
        assert_eq!(app.mailer.sent().len(), 2);

        let res = app
            .get("/verify-email?status=verification-link-sent", Some(&cookie))
            .await;
        assert_eq!(body_json(res).await["status"], "verification-link-sent");
    }

    #[tokio::test]
    async fn test_verified_user_is_sent_to_landing_page() {
        let app = app();
        let cookie = app.register("a@example.com").await;
        app.get(&app.last_link("a@example.com"), Some(&cookie)).await;

        let res = app
            .post("/email/verification-notification", Some(&cookie))
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/dashboard");
        assert_eq!(app.mailer.sent().len(), 1);

        let res = app.get("/verify-email", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/dashboard");
    }

    #[tokio::test]
    async fn test_dashboard_requires_verified_email() {
        let app = app();
        let cookie = app.register("a@example.com").await;

        let res = app.get("/dashboard", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/verify-email");

        app.get(&app.last_link("a@example.com"), Some(&cookie)).await;

        let res = app.get("/dashboard", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["email"], "a@example.com");
        assert!(body["emailVerifiedAt"].is_string());
    }

    #[tokio::test]
    async fn test_verification_routes_require_session() {
        let app = app();
        app.register("a@example.com").await;
        let link = app.last_link("a@example.com");

        for res in [
            app.get("/verify-email", None).await,
            app.get(&link, None).await,
            app.post("/email/verification-notification", None).await,
            app.get("/dashboard", Some("auth_session=forged.token")).await,
        ] {
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(res.headers().get("X-Auth-Required").unwrap(), "true");
        }
        assert!(!app.user("a@example.com").await.has_verified_email());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let app = app();
        app.register("a@example.com").await;

        let bad = serde_json::json!({ "email": "a@example.com", "password": "nope nope nope" });
        let res = app
            .send(json_request("POST", "/login", None, bad.to_string()))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let good = serde_json::json!({
            "email": "A@example.com",
            "password": PASSWORD,
            "rememberMe": true,
        });
        let res = app
            .send(json_request("POST", "/login", None, good.to_string()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        assert!(
            res.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .contains(&format!("Max-Age={}", app.config.session_ttl_long.as_secs()))
        );
        assert_eq!(body_json(res).await["emailVerified"], false);

        assert_eq!(app.get("/verify-email", Some(&cookie)).await.status(), StatusCode::OK);

        let res = app.post("/logout", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(
            res.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );

        assert_eq!(
            app.get("/verify-email", Some(&cookie)).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let app = app();
        app.register("a@example.com").await;

        let body = serde_json::json!({ "email": "a@example.com", "password": PASSWORD });
        let res = app
            .send(json_request("POST", "/register", None, body.to_string()))
            .await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(app.mailer.sent().len(), 1);
    }

    /// `{id, hash, expires, signature, password}` from a mailed reset link
    fn reset_body(link: &str, password: &str) -> String {
        let (path, query) = link.split_once('?').unwrap();
        let mut segments = path.rsplit('/');
        let hash = segments.next().unwrap();
        let id = segments.next().unwrap();
        let params: std::collections::HashMap<&str, &str> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .collect();

        serde_json::json!({
            "id": id,
            "hash": hash,
            "expires": params["expires"],
            "signature": params["signature"],
            "password": password,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_forgot_password_answers_alike_for_unknown_email() {
        let app = app();
        app.register("a@example.com").await;

        let mut bodies = Vec::new();
        for email in ["a@example.com", "nobody@example.com"] {
            let body = serde_json::json!({ "email": email }).to_string();
            let res = app
                .send(json_request("POST", "/forgot-password", None, body))
                .await;
            assert_eq!(res.status(), StatusCode::ACCEPTED);
            bodies.push(body_json(res).await);
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[0]["status"], "reset-link-sent");
        let resets: Vec<_> = app
            .mailer
            .sent()
            .into_iter()
            .filter(|m| m.link.action == SignedAction::ResetPassword)
            .collect();
        assert_eq!(resets.len(), 1);
        assert_eq!(resets[0].to.as_str(), "a@example.com");
    }

    #[tokio::test]
    async fn test_password_can_be_reset_once() {
        let mut app = app();
        let cookie = app.register("a@example.com").await;

        let body = serde_json::json!({ "email": "a@example.com" }).to_string();
        app.send(json_request("POST", "/forgot-password", None, body))
            .await;
        let link = app.last_link_for(SignedAction::ResetPassword, "a@example.com");
        assert!(link.starts_with("/reset-password/"));
        app.events_received();

        let new_password = "a brand new passphrase";
        let res = app
            .send(json_request(
                "POST",
                "/reset-password",
                None,
                reset_body(&link, new_password),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(
            res.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );
        assert_eq!(body_json(res).await["status"], "password-reset");
        assert!(
            app.events_received()
                .iter()
                .any(|e| matches!(e, AuthEvent::PasswordReset { .. }))
        );

        // The old session is gone
        assert_eq!(
            app.get("/verify-email", Some(&cookie)).await.status(),
            StatusCode::UNAUTHORIZED
        );

        // Same link again: the password it was bound to no longer exists
        let res = app
            .send(json_request(
                "POST",
                "/reset-password",
                None,
                reset_body(&link, "yet another passphrase"),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(res).await["detail"], "This action is unauthorized.");

        let login = |password: &str| {
            serde_json::json!({ "email": "a@example.com", "password": password }).to_string()
        };
        let res = app
            .send(json_request("POST", "/login", None, login(PASSWORD)))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = app
            .send(json_request("POST", "/login", None, login(new_password)))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_expired_reset_link_is_forbidden() {
        let app = app();
        app.register("a@example.com").await;

        let body = serde_json::json!({ "email": "a@example.com" }).to_string();
        app.send(json_request("POST", "/forgot-password", None, body))
            .await;
        let link = app.last_link_for(SignedAction::ResetPassword, "a@example.com");

        app.clock.advance(Duration::minutes(61));
        let res = app
            .send(json_request(
                "POST",
                "/reset-password",
                None,
                reset_body(&link, "a brand new passphrase"),
            ))
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
