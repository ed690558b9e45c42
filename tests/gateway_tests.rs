//! Gateway behaviour: credential attachment, error classification, and the
//! single teardown on a rejected session.

mod common;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_for, delayed, harness, harness_with, ticket_json};
use helpdesk::api::TicketFilter;
use helpdesk::gateway::ApiRequest;
use helpdesk::identity::MemoryTokenStorage;
use helpdesk::{AppError, MessageKind};

#[tokio::test]
async fn session_requests_carry_bearer_token() {
    let h = harness().await;
    let token = h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([ticket_json(1, "OPEN", 1)])))
        .expect(1)
        .mount(&h.server)
        .await;

    let tickets = h.client.tickets.load(&TicketFilter::default()).await.expect("load");
    assert_eq!(tickets.len(), 1);
    let reqs = h.requests_under("/tickets").await;
    assert!(reqs[0].headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn concurrent_401s_tear_down_once() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/tickets"))
        .respond_with(delayed(401, json!({"detail": "Token expired"}), 100))
        .mount(&h.server)
        .await;

    let filter = TicketFilter::default();
    let (a, b, c) = tokio::join!(
        h.client.tickets.load(&filter),
        h.client.tickets.load(&filter),
        h.client.tickets.load(&filter),
    );

    for res in [a, b, c] {
        assert_eq!(res.unwrap_err().kind(), MessageKind::SessionExpired);
    }
    assert_eq!(h.navigator.redirects(), 1);
    assert_eq!(h.navigator.routes(), vec!["/login".to_string()]);
    assert!(h.client.store.current().is_none());
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn rejected_session_request_is_not_retried() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/departments"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&h.server)
        .await;

    let mut req = ApiRequest::get("/departments");
    let err = h.client.gateway.execute(&mut req).await.unwrap_err();
    assert_eq!(err.kind(), MessageKind::SessionExpired);
    assert!(req.retry_suppressed());

    // the session is gone; a second call goes out without a credential and is
    // still a session expiry, but the redirect already happened
    let err = h.client.gateway.execute(&mut req).await.unwrap_err();
    assert_eq!(err.kind(), MessageKind::SessionExpired);
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn session_request_without_session_redirects_once() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/tickets/stats/department"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .expect(2)
        .mount(&h.server)
        .await;

    for _ in 0..2 {
        let err = h.client.gateway.send(ApiRequest::get("/tickets/stats/department")).await.unwrap_err();
        assert_eq!(err.kind(), MessageKind::SessionExpired);
    }
    assert_eq!(h.navigator.redirects(), 1);
    let reqs = h.requests_under("/tickets").await;
    assert!(reqs.iter().all(|r| r.headers.get("authorization").is_none()));
}

#[tokio::test]
async fn session_expiring_locally_mid_flight_still_redirects() {
    let h = harness().await;
    let now = chrono::Utc::now().timestamp();
    let claims = json!({"sub": "1", "iat": now - 10, "exp": now + 2});
    let token = format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );
    h.mount_profile(&token, 1, "admin").await;
    h.client.sessions.establish(&token).await.expect("establish");
    Mock::given(method("GET"))
        .and(path("/departments"))
        .respond_with(delayed(401, json!({"detail": "Token expired"}), 3_000))
        .mount(&h.server)
        .await;

    let gateway = h.client.gateway.clone();
    let pending = tokio::spawn(async move { gateway.send(ApiRequest::get("/departments")).await });
    tokio::time::sleep(std::time::Duration::from_millis(2_500)).await;
    // the local clock drops the session before the server answers
    assert!(h.client.store.current().is_none());
    assert_eq!(h.navigator.redirects(), 0);

    let err = pending.await.expect("join").unwrap_err();
    assert_eq!(err.kind(), MessageKind::SessionExpired);
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn bearer_401_is_auth_failure_without_redirect() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let err = h.client.gateway.send(ApiRequest::get("/auth/me").bearer("tok-bad")).await.unwrap_err();
    assert_eq!(err.kind(), MessageKind::AuthFailure);
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn timeout_is_network_unreachable_and_keeps_session() {
    let server = MockServer::start().await;
    let mut cfg = config_for(&server);
    cfg.timeout = std::time::Duration::from_millis(200);
    let h = harness_with(server, cfg, MemoryTokenStorage::new());
    h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/tickets/stats/"))
        .respond_with(delayed(200, json!({"total": 1}), 2_000))
        .mount(&h.server)
        .await;

    let err = h.client.tickets.stats().await.unwrap_err();

    assert_eq!(err, AppError::network("timeout", "the request timed out"));
    assert!(h.client.store.current().is_some());
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn refused_connection_is_network_unreachable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let server = MockServer::start().await;
    let cfg = config_for(&server).with_api_url(format!("http://127.0.0.1:{}", port)).expect("url");
    let h = harness_with(server, cfg, MemoryTokenStorage::new());

    let err = h.client.gateway.send(ApiRequest::get("/departments").anonymous()).await.unwrap_err();
    assert_eq!(err.kind(), MessageKind::NetworkUnreachable);
    assert_eq!(err.code_str(), "unreachable");
    assert_eq!(err.http_status(), None);
}

#[tokio::test]
async fn error_statuses_are_classified_with_detail() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    let cases: Vec<(&str, u16, Value, MessageKind, &str)> = vec![
        ("/a", 403, json!({"detail": "Not enough permissions"}), MessageKind::Forbidden, "Not enough permissions"),
        ("/b", 404, json!({"detail": "Ticket not found"}), MessageKind::NotFound, "Ticket not found"),
        (
            "/c",
            422,
            json!({"detail": [{"msg": "field required"}, {"msg": "value is not a valid enum"}]}),
            MessageKind::ValidationFailed,
            "field required; value is not a valid enum",
        ),
        ("/d", 409, json!({}), MessageKind::ValidationFailed, "the request was rejected as invalid"),
        ("/e", 503, json!({"detail": "maintenance"}), MessageKind::ServerError, "maintenance"),
    ];
    for (p, status, body, _, _) in &cases {
        Mock::given(method("GET"))
            .and(path(*p))
            .respond_with(ResponseTemplate::new(*status).set_body_json(body.clone()))
            .mount(&h.server)
            .await;
    }

    for (p, status, _, kind, message) in cases {
        let err = h.client.gateway.send(ApiRequest::get(p)).await.unwrap_err();
        assert_eq!(err.kind(), kind, "{p}");
        assert_eq!(err.message(), message, "{p}");
        assert_eq!(err.code_str(), format!("http_{}", status), "{p}");
    }
    assert!(h.client.store.current().is_some());
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn malformed_success_body_is_server_error() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/tickets/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&h.server)
        .await;

    let err = h.client.tickets.open("5").await.unwrap_err();
    assert_eq!(err.kind(), MessageKind::ServerError);
    assert_eq!(err.code_str(), "malformed_response");
}

#[tokio::test]
async fn public_login_sends_no_credential() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-next"})))
        .mount(&h.server)
        .await;
    h.mount_profile("tok-next", 2, "support").await;

    let req = helpdesk::identity::LoginRequest { username: "bob".into(), password: "pw".into() };
    h.client.sessions.login(&req).await.expect("login");

    let reqs = h.requests_under("/auth/login").await;
    assert_eq!(reqs.len(), 1);
    assert!(reqs[0].headers.get("authorization").is_none());
    let body = String::from_utf8_lossy(&reqs[0].body).to_string();
    assert!(body.contains("username=bob") && body.contains("password=pw"), "{body}");
}

#[tokio::test]
async fn path_segments_are_encoded() {
    let h = harness().await;
    h.sign_in(1, "admin").await;
    Mock::given(method("GET"))
        .and(path("/departments/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a/b", "name": "Ops"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let dept = h.client.departments.get("a/b").await.expect("department");
    assert_eq!(dept.name, "Ops");
}
