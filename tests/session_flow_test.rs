//! End-to-end session flows over HTTP
//!
//! Test Coverage:
//! - Sign-in persists the fallback cookie as the local marker
//! - A later run with the marker skips the sign-in redirect
//! - A first run without a marker redirects before checking the user
//! - Sign-out clears the marker

mod test_harness;

use snapgram_client::{AuthState, Route, SigninForm};
use test_harness::{account_json, app, client_config, user_list, PROJECT, USERS};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIE: &str = r#"{"a_session_snapgram":"token"}"#;

async fn mount_current_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .and(header("X-Fallback-Cookies", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(USERS))
        .and(query_param("queries[]", r#"equal("accountId", ["a1"])"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_list()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sign_in_then_restart_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/account/sessions/email"))
        .and(header("X-Appwrite-Project", PROJECT))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Fallback-Cookies", COOKIE)
                .set_body_json(serde_json::json!({
                    "$id": "s1", "userId": "a1", "expire": "2030-01-01"
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_current_user(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("session");

    // First run: sign in
    let (first, screen) = app(client_config(&server, &marker, 500));
    let user = first
        .session()
        .sign_in(SigninForm {
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.username, "ada");
    assert_eq!(screen.routes(), vec![Route::Home]);
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), COOKIE);

    // Second run: marker present, no redirect
    let (second, screen) = app(client_config(&server, &marker, 500));
    assert!(second.session().bootstrap().await);
    assert!(screen.routes().is_empty());
    assert!(matches!(second.session().state(), AuthState::Authenticated(u) if u.id == "u1"));
}

#[tokio::test]
async fn test_first_run_redirects_to_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "User (role: guests) missing scope (account)",
            "code": 401,
            "type": "general_unauthorized_scope"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (app, screen) = app(client_config(&server, &dir.path().join("session"), 500));

    assert!(!app.session().bootstrap().await);
    assert_eq!(screen.routes(), vec![Route::SignIn]);
    assert_eq!(app.session().state(), AuthState::Unauthenticated);
    assert!(!app.session().is_loading());
}

#[tokio::test]
async fn test_sign_out_clears_marker() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/v1/account/sessions/current"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("session");
    std::fs::write(&marker, COOKIE).unwrap();

    let (app, screen) = app(client_config(&server, &marker, 500));
    assert!(app.session().bootstrap().await);

    app.session().sign_out().await.unwrap();

    assert_eq!(app.session().state(), AuthState::Unauthenticated);
    assert_eq!(screen.routes(), vec![Route::SignIn]);
    assert!(app.queries().cache().is_empty());
    let remaining = std::fs::read_to_string(&marker).unwrap_or_default();
    assert!(remaining.is_empty() || remaining == "[]");
}
