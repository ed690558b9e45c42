//! Shared fixtures for the integration tests: a client wired to a wiremock
//! backend with in-memory token storage and a navigator that counts redirects.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use helpdesk::config::ClientConfig;
use helpdesk::gateway::Navigator;
use helpdesk::identity::{MemoryTokenStorage, TokenStorage};
use helpdesk::HelpdeskClient;

#[derive(Default)]
pub struct RecordingNavigator {
    count: AtomicUsize,
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize { self.count.load(Ordering::SeqCst) }
    pub fn routes(&self) -> Vec<String> { self.routes.lock().clone() }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self, route: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().push(route.to_string());
    }
}

pub struct Harness {
    pub server: MockServer,
    pub client: HelpdeskClient,
    pub storage: Arc<MemoryTokenStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_api_url(server.uri()).expect("mock server uri is a valid base url")
}

pub async fn harness() -> Harness {
    let server = MockServer::start().await;
    let cfg = config_for(&server);
    harness_with(server, cfg, MemoryTokenStorage::new())
}

pub fn harness_with(server: MockServer, cfg: ClientConfig, storage: MemoryTokenStorage) -> Harness {
    let storage = Arc::new(storage);
    let navigator = Arc::new(RecordingNavigator::default());
    let client = HelpdeskClient::with_parts(cfg, storage.clone(), navigator.clone()).expect("client");
    Harness { server, client, storage, navigator }
}

impl Harness {
    pub fn persisted(&self) -> Option<String> { self.storage.load().expect("memory storage") }

    /// Answer `/auth/me` for `token` with a profile of the given role.
    pub async fn mount_profile(&self, token: &str, id: u64, role: &str) {
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(id, role)))
            .mount(&self.server)
            .await;
    }

    /// Establish a session for a principal with `id` and `role`; returns the token used.
    pub async fn sign_in(&self, id: u64, role: &str) -> String {
        let token = format!("tok-{}-{}", role, id);
        self.mount_profile(&token, id, role).await;
        self.client.sessions.establish(&token).await.expect("establish");
        token
    }

    /// Mount `GET /tickets/:id` and start tracking the ticket through the workflow.
    pub async fn open_ticket(&self, ticket: Value) {
        let id = ticket["id"].to_string();
        Mock::given(method("GET"))
            .and(path(format!("/tickets/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(ticket))
            .mount(&self.server)
            .await;
        self.client.tickets.open(&id).await.expect("open ticket");
    }

    /// Requests received for paths under `prefix`.
    pub async fn requests_under(&self, prefix: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .collect()
    }
}

pub fn profile_json(id: u64, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@example.com", id),
        "first_name": "Test",
        "last_name": format!("User{}", id),
        "role": role,
        "department_id": 3
    })
}

pub fn ticket_json(id: u64, status: &str, created_by: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Ticket {}", id),
        "description": "Printer on floor 2 is out of toner",
        "category": "HARDWARE",
        "priority": "MEDIUM",
        "status": status,
        "support_level": "LEVEL_1",
        "department_id": 3,
        "created_by_id": created_by,
        "assigned_to_id": null,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00"
    })
}

pub fn with_field(mut v: Value, key: &str, value: Value) -> Value {
    v[key] = value;
    v
}

pub fn delayed(status: u16, body: Value, ms: u64) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body).set_delay(Duration::from_millis(ms))
}
