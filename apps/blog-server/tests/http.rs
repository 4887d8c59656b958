//! HTTP surface: status codes, page names and redirects.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use serde_json::Value;

use blog_core::domain::{BlogUser, NewUser, Role};
use blog_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use blog_infra::{
    Argon2PasswordService, InMemoryRateLimiter, InMemoryStore, JwtConfig, JwtTokenService,
    PasswordConfig, RateLimitConfig,
};
use blog_server::configure_app;
use blog_server::observability::RequestIdMiddleware;
use blog_server::state::AppState;

struct Harness {
    store: Arc<InMemoryStore>,
    tokens: Arc<JwtTokenService>,
    passwords: Arc<Argon2PasswordService>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "http-test-secret".to_string(),
                expiration_hours: 1,
                issuer: "blog-api".to_string(),
            })),
            passwords: Arc::new(
                Argon2PasswordService::with_config(PasswordConfig {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                })
                .unwrap(),
            ),
        }
    }

    fn state(&self) -> AppState {
        AppState::from_parts(
            self.store.clone(),
            self.store.clone(),
            self.tokens.clone(),
            self.passwords.clone(),
            20,
        )
    }

    async fn user(&self, username: &str) -> BlogUser {
        self.store
            .create(NewUser {
                username: username.to_string(),
                password_hash: self.passwords.hash("password1").unwrap(),
                roles: vec![Role::User],
            })
            .await
            .unwrap()
    }

    fn bearer(&self, user: &BlogUser) -> String {
        let token = self
            .tokens
            .generate_token(user.id, &user.username, user.role_names())
            .unwrap();
        format!("Bearer {}", token)
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .configure(configure_app($state)),
        )
        .await
    };
}

fn post_form(title: &str, body: &str) -> [(&'static str, String); 2] {
    [("title", title.to_string()), ("body", body.to_string())]
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn create_then_view_post() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .set_form(post_form("Hello World!", "first post"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let post_url = location(&resp);
    assert!(post_url.starts_with("/post/"));

    // Anonymous reader
    let req = test::TestRequest::get().uri(&post_url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "post");
    assert_eq!(body["post"]["title"], "Hello World!");
    assert_eq!(body["post"]["user"]["username"], "alice");
    assert_eq!(body["isOwner"], false);

    // Owner
    let req = test::TestRequest::get()
        .uri(&post_url)
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isOwner"], true);

    // Home lists it
    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["view"], "home");
    assert_eq!(body["posts"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn missing_post_renders_404_page() {
    let h = Harness::new();
    let app = app!(h.state());

    let req = test::TestRequest::get().uri("/post/999").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "404");
}

#[actix_web::test]
async fn new_post_form_requires_role() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let app = app!(h.state());

    let req = test::TestRequest::get().uri("/createNewPost").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let role_less = format!(
        "Bearer {}",
        h.tokens.generate_token(alice.id, "alice", vec![]).unwrap()
    );
    let req = test::TestRequest::get()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, role_less))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Access Denied");

    let req = test::TestRequest::get()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "postForm");
    assert_eq!(body["post"]["user"]["username"], "alice");
    assert!(body["post"].get("id").is_none());
}

#[actix_web::test]
async fn principal_without_account_gets_error_page() {
    let h = Harness::new();
    let app = app!(h.state());

    let ghost = format!(
        "Bearer {}",
        h.tokens
            .generate_token(42, "ghost", vec![Role::User.as_str().to_string()])
            .unwrap()
    );
    let req = test::TestRequest::get()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, ghost))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "error");
}

#[actix_web::test]
async fn invalid_post_returns_form_with_errors() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .set_form(post_form("Hello", "body"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "postForm");
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(
        body["errors"][0]["message"],
        "Title must be at least 7 characters long"
    );
    assert_eq!(body["form"]["title"], "Hello");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn edit_and_delete_are_owner_only() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .set_form(post_form("Hello World!", "first post"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let id = location(&resp).trim_start_matches("/post/").to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/editPost/{id}"))
        .insert_header((header::AUTHORIZATION, h.bearer(&bob)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "403");

    let req = test::TestRequest::post()
        .uri(&format!("/deletePost/{id}"))
        .insert_header((header::AUTHORIZATION, h.bearer(&bob)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/editPost/999")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "error");

    let req = test::TestRequest::get()
        .uri(&format!("/editPost/{id}"))
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["view"], "postForm");
    assert_eq!(body["post"]["title"], "Hello World!");

    let req = test::TestRequest::post()
        .uri(&format!("/editPost/{id}"))
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .set_form(post_form("Hello again, World!", "edited"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/post/{id}"));

    let req = test::TestRequest::get()
        .uri(&format!("/post/{id}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["title"], "Hello again, World!");

    let req = test::TestRequest::post()
        .uri(&format!("/deletePost/{id}"))
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::get()
        .uri(&format!("/post/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn bad_token_is_rejected_even_on_public_pages() {
    let h = Harness::new();
    let app = app!(h.state());

    let req = test::TestRequest::get()
        .uri("/post/10")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn register_login_and_me() {
    let h = Harness::new();
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({"username": "alice", "password": "password1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["roles"][0], "ROLE_USER");
    assert!(body["user"].get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({"username": "alice", "password": "password2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"username": "alice", "password": "wrong-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"username": "alice", "password": "password1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap_or_default().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "alice");

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn registration_is_validated() {
    let h = Harness::new();
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({"username": "al", "password": "short"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({"username": "anonymousUser", "password": "password1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn unreadable_post_form_is_bad_request() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/createNewPost")
        .insert_header((header::AUTHORIZATION, h.bearer(&alice)))
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("title=Hello+World!")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Bad Request");
    assert!(body["detail"].is_string());
    assert_eq!(h.store.find_recent(10).await.unwrap().len(), 0);
}

#[actix_web::test]
async fn disabled_account_cannot_login() {
    let h = Harness::new();
    let alice = h.user("alice").await;
    h.store.set_enabled(alice.id, false).await.unwrap();
    let app = app!(h.state());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"username": "alice", "password": "password1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn auth_endpoints_are_rate_limited() {
    let h = Harness::new();
    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
        ..RateLimitConfig::default()
    })
    .unwrap();
    let app = app!(h.state().with_rate_limiter(Arc::new(limiter)));

    let login = || {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({"username": "nobody", "password": "password1"}))
            .to_request()
    };

    assert_eq!(
        test::call_service(&app, login()).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        test::call_service(&app, login()).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));

    // Post pages are not limited
    let req = test::TestRequest::get().uri("/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn health_echoes_request_id() {
    let h = Harness::new();
    let app = app!(h.state());

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("X-Request-ID", "req-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["request_id"], "req-123");
}
