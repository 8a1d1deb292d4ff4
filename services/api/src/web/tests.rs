//! Request-level tests of the full router against in-memory backends.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use std::sync::atomic::Ordering;
use tower::ServiceExt;
use uuid::Uuid;

use super::router;
use study_assistant_core::ports::PortError;

use super::test_support::{auth_cookie, expired_cookie, TestBackend, EMAIL, PASSWORD, REFRESHED_ACCESS};

fn app(backend: &TestBackend) -> Router {
    router(backend.state())
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

// -- Access control --

#[tokio::test]
async fn signed_out_pages_redirect_to_sign_in() {
    let backend = TestBackend::new();
    let id = Uuid::new_v4();
    for uri in [
        "/dashboard".to_string(),
        "/dashboard/new-session".to_string(),
        format!("/dashboard/session/{id}"),
        format!("/ws/sessions/{id}"),
    ] {
        let response = app(&backend).oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/auth/sign-in", "{uri}");
    }
}

#[tokio::test]
async fn signed_out_api_calls_get_401_json() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(get("/api/sessions", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_stored() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(get("/dashboard", Some(&expired_cookie())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("sb-access-token={REFRESHED_ACCESS};"))));
}

#[tokio::test]
async fn provider_outage_keeps_the_browser_signed_in() {
    let backend = TestBackend::new();
    backend.take_auth_offline();

    let page = app(&backend)
        .oneshot(get("/dashboard", Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), "/auth/sign-in?notice=sign_in_failed");
    assert!(
        set_cookies(&page).is_empty(),
        "cookies must survive an unreachable provider"
    );

    let api = app(&backend)
        .oneshot(get("/api/sessions", Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookies(&api).is_empty());
}

#[tokio::test]
async fn rejected_token_clears_the_auth_cookies() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(get(
            "/dashboard",
            Some("sb-access-token=forged; sb-refresh-token=forged; sb-expires-at=9999999999"),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/auth/sign-in");
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("sb-refresh-token=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn landing_offers_dashboard_only_when_signed_in() {
    let backend = TestBackend::new();
    let anonymous = body_text(app(&backend).oneshot(get("/", None)).await.unwrap()).await;
    assert!(anonymous.contains("Start a Study Session"));

    let signed_in = body_text(
        app(&backend)
            .oneshot(get("/", Some(&auth_cookie())))
            .await
            .unwrap(),
    )
    .await;
    assert!(signed_in.contains("Go to Dashboard"));
    assert!(signed_in.contains(EMAIL));
}

// -- Sign-in and sign-out --

#[tokio::test]
async fn wrong_password_rerenders_with_message() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(post_form(
            "/auth/sign-in",
            &format!("email={}&password=nope", urlencoding::encode(EMAIL)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert!(body_text(response).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn password_sign_in_sets_cookies_and_goes_to_dashboard() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(post_form(
            "/auth/sign-in",
            &format!("email={}&password={PASSWORD}", urlencoding::encode(EMAIL)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=access-token;")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=")));
}

#[tokio::test]
async fn oauth_round_trip_uses_the_stored_verifier() {
    let backend = TestBackend::new();
    let start = app(&backend)
        .oneshot(get("/auth/oauth/google", None))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::SEE_OTHER);
    assert!(location(&start).starts_with("https://idp.test/authorize?provider=google"));
    let pkce = set_cookies(&start)
        .into_iter()
        .find(|c| c.starts_with("sb-pkce-verifier="))
        .unwrap();
    let pair = pkce.split(';').next().unwrap().to_string();

    let callback = app(&backend)
        .oneshot(get("/auth/callback?code=good-code", Some(&pair)))
        .await
        .unwrap();
    assert_eq!(location(&callback), "/dashboard");

    let missing_verifier = app(&backend)
        .oneshot(get("/auth/callback?code=good-code", None))
        .await
        .unwrap();
    assert_eq!(location(&missing_verifier), "/auth/sign-in?notice=sign_in_failed");
}

#[tokio::test]
async fn sign_out_clears_every_auth_cookie() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(post_form("/auth/sign-out", "", Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(backend.auth.sign_out_calls.load(Ordering::SeqCst), 1);

    let cookies = set_cookies(&response);
    for name in super::cookies::ALL {
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("{name}=;")) && c.contains("Max-Age=0")),
            "{name} not cleared"
        );
    }
}

#[tokio::test]
async fn failed_sign_out_still_clears_cookies_and_reports() {
    let backend = TestBackend::new();
    backend.auth.fail_sign_out.store(true, Ordering::SeqCst);
    let response = app(&backend)
        .oneshot(post_form("/auth/sign-out", "", Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?notice=sign_out_failed");
    assert_eq!(set_cookies(&response).len(), 4);
}

// -- Dashboard --

#[tokio::test]
async fn dashboard_lists_sessions_newest_first() {
    let backend = TestBackend::new();
    backend.seed("Alpha Calculus", 0);
    backend.seed("Beta Chemistry", 120);
    backend.seed("Gamma Biology", 60);

    let response = app(&backend)
        .oneshot(get("/dashboard", Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let beta = html.find("Beta Chemistry").unwrap();
    let gamma = html.find("Gamma Biology").unwrap();
    let alpha = html.find("Alpha Calculus").unwrap();
    assert!(beta < gamma && gamma < alpha);
}

#[tokio::test]
async fn invalid_modal_form_is_rejected_before_any_backend_call() {
    let backend = TestBackend::new();
    let long_title = "x".repeat(31);
    for (body, message) in [
        ("title=&description=Finals", "Please provide a title for your study session"),
        (
            &*format!("title={long_title}&description=Finals"),
            "Title must be 30 characters or less",
        ),
        ("title=Calculus&description=+++", "Please provide a description"),
    ] {
        let response = app(&backend)
            .oneshot(post_form("/dashboard/sessions", body, Some(&auth_cookie())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(message), "missing '{message}'");
        assert!(html.contains("New study session"), "modal should stay open");
    }
    assert_eq!(backend.sessions.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn created_session_shows_up_on_the_refetched_dashboard() {
    let backend = TestBackend::new();
    backend.seed("Older Session", 0);

    let response = app(&backend)
        .oneshot(post_form(
            "/dashboard/sessions",
            "title=Linear+Algebra&description=Midterm+prep&learning_goals=Eigenvalues",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?notice=session_created");
    assert_eq!(backend.sessions.list_calls.load(Ordering::SeqCst), 0);

    let html = body_text(
        app(&backend)
            .oneshot(get(location(&response), Some(&auth_cookie())))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(backend.sessions.list_calls.load(Ordering::SeqCst), 1);
    assert!(html.contains("Study session created successfully!"));
    let newest = html.find("Linear Algebra").unwrap();
    let older = html.find("Older Session").unwrap();
    assert!(newest < older);
}

#[tokio::test]
async fn standalone_form_accepts_missing_title_but_not_bad_level() {
    let backend = TestBackend::new();

    let rejected = app(&backend)
        .oneshot(post_form(
            "/dashboard/new-session",
            "description=Boards&study_level=postdoc",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::OK);
    assert_eq!(backend.sessions.create_calls.load(Ordering::SeqCst), 0);

    let accepted = app(&backend)
        .oneshot(post_form(
            "/dashboard/new-session",
            "description=Boards&study_level=professional",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::SEE_OTHER);
    let rows = backend.sessions.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "");
    assert_eq!(rows[0].study_level, "professional");
}

#[tokio::test]
async fn delete_confirmation_then_delete() {
    let backend = TestBackend::new();
    let session = backend.seed("Doomed", 0);

    let confirm = body_text(
        app(&backend)
            .oneshot(get(
                &format!("/dashboard?delete={}", session.id),
                Some(&auth_cookie()),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(confirm.contains(&format!("/dashboard/sessions/{}/delete", session.id)));

    let response = app(&backend)
        .oneshot(post_form(
            &format!("/dashboard/sessions/{}/delete", session.id),
            "",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard?notice=session_deleted");
    assert!(backend.sessions.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_create_keeps_the_modal_open_with_input() {
    let backend = TestBackend::new();
    backend.fail_writes(PortError::Unexpected("upstream 503".to_string()));

    let response = app(&backend)
        .oneshot(post_form(
            "/dashboard/sessions",
            "title=Thermodynamics&description=Entropy+review",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("New study session"));
    assert!(html.contains("value=\"Thermodynamics\""));
    assert!(html.contains("Entropy review"));
    assert!(html.contains("Failed to create study session"));
    assert!(!html.contains("upstream 503"));
    assert!(backend.sessions.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_delete_returns_to_dashboard_with_error() {
    let backend = TestBackend::new();
    let session = backend.seed("Survivor", 0);
    backend.fail_writes(PortError::Unexpected("upstream 503".to_string()));

    let response = app(&backend)
        .oneshot(post_form(
            &format!("/dashboard/sessions/{}/delete", session.id),
            "",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?notice=delete_failed");
    assert_eq!(backend.sessions.rows.lock().unwrap().len(), 1);

    let html = body_text(
        app(&backend)
            .oneshot(get(location(&response), Some(&auth_cookie())))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("Failed to delete study session"));
    assert!(html.contains("Survivor"));
}

#[tokio::test]
async fn standalone_form_shows_backend_validation_message() {
    let backend = TestBackend::new();
    backend.fail_writes(PortError::Validation(
        "Description is too long".to_string(),
    ));

    let response = app(&backend)
        .oneshot(post_form(
            "/dashboard/new-session",
            "title=Boards&description=Cardiology",
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Description is too long"));
    assert!(html.contains("Cardiology"));
}

#[tokio::test]
async fn free_text_notice_is_not_rendered() {
    let backend = TestBackend::new();
    let html = body_text(
        app(&backend)
            .oneshot(get(
                "/dashboard?notice=Your%20account%20is%20locked",
                Some(&auth_cookie()),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(!html.contains("Your account is locked"));

    let sign_in = body_text(
        app(&backend)
            .oneshot(get("/auth/sign-in?toast=Call%20555-0100", None))
            .await
            .unwrap(),
    )
    .await;
    assert!(!sign_in.contains("555-0100"));
}

#[tokio::test]
async fn chat_page_for_missing_session_goes_back_with_error() {
    let backend = TestBackend::new();
    let response = app(&backend)
        .oneshot(get(
            &format!("/dashboard/session/{}", Uuid::new_v4()),
            Some(&auth_cookie()),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard?notice=session_load_failed");
}

#[tokio::test]
async fn chat_page_renders_session_header() {
    let backend = TestBackend::new();
    let session = backend.seed("Organic Chemistry", 0);
    let html = body_text(
        app(&backend)
            .oneshot(get(
                &format!("/dashboard/session/{}", session.id),
                Some(&auth_cookie()),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("Organic Chemistry"));
    assert!(html.contains(&format!("data-session-id=\"{}\"", session.id)));
}

#[tokio::test]
async fn untitled_session_gets_a_placeholder_header() {
    let backend = TestBackend::new();
    let session = backend.seed("", 0);
    let html = body_text(
        app(&backend)
            .oneshot(get(
                &format!("/dashboard/session/{}", session.id),
                Some(&auth_cookie()),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("Untitled session"));
}

// -- JSON API --

#[tokio::test]
async fn api_create_validates_then_stores() {
    let backend = TestBackend::new();

    let bad = app(&backend)
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            r#"{"title":"","description":"Finals"}"#,
            &auth_cookie(),
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.sessions.create_calls.load(Ordering::SeqCst), 0);

    let created = app(&backend)
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            r#"{"title":"Statistics","description":"Finals"}"#,
            &auth_cookie(),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: serde_json::Value = serde_json::from_str(&body_text(created).await).unwrap();
    assert_eq!(body["title"], "Statistics");
    let id = body["id"].as_str().unwrap().to_string();

    let fetched = app(&backend)
        .oneshot(get(&format!("/api/sessions/{id}"), Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);

    let deleted = app(&backend)
        .oneshot(json_request(
            "DELETE",
            &format!("/api/sessions/{id}"),
            "",
            &auth_cookie(),
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app(&backend)
        .oneshot(get(&format!("/api/sessions/{id}"), Some(&auth_cookie())))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_lists_newest_first_and_reports_current_user() {
    let backend = TestBackend::new();
    backend.seed("First", 0);
    backend.seed("Second", 30);

    let list = app(&backend)
        .oneshot(get("/api/sessions", Some(&auth_cookie())))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_text(list).await).unwrap();
    assert_eq!(body[0]["title"], "Second");
    assert_eq!(body[1]["title"], "First");

    let me = app(&backend)
        .oneshot(get("/api/me", Some(&auth_cookie())))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_text(me).await).unwrap();
    assert_eq!(body["email"], EMAIL);
}
