use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::AppResult;
use crate::gateway::{segment, ApiGateway, ApiRequest};

use super::models::{NewTicket, SupportLevel, Ticket, TicketChanges, TicketFilter, TicketStatus};

/// Raw `/tickets` endpoints. Authorization is the workflow engine's job; this
/// layer only speaks HTTP.
#[derive(Clone)]
pub struct TicketsApi {
    gateway: Arc<ApiGateway>,
}

fn ticket_path(id: &str) -> String { format!("/tickets/{}", segment(id)) }

fn admin_ticket_path(id: &str) -> String { format!("/tickets/admin/tickets/{}", segment(id)) }

impl TicketsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self { Self { gateway } }

    pub async fn list(&self, filter: &TicketFilter) -> AppResult<Vec<Ticket>> {
        let mut req = ApiRequest::get("/tickets");
        if let Some(s) = filter.status {
            req = req.query("status", s.as_str());
        }
        if let Some(p) = filter.priority {
            req = req.query("priority", p.as_str());
        }
        if let Some(skip) = filter.skip {
            req = req.query("skip", skip.to_string());
        }
        if let Some(limit) = filter.limit {
            req = req.query("limit", limit.to_string());
        }
        self.gateway.send_json(req).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Ticket> {
        self.gateway.send_json(ApiRequest::get(ticket_path(id))).await
    }

    pub async fn create(&self, ticket: &NewTicket) -> AppResult<Ticket> {
        self.gateway.send_json(ApiRequest::post("/tickets").json(ticket)?).await
    }

    pub async fn update(&self, id: &str, changes: &TicketChanges) -> AppResult<Ticket> {
        self.gateway.send_json(ApiRequest::put(ticket_path(id)).json(changes)?).await
    }

    pub async fn update_status(&self, id: &str, status: TicketStatus) -> AppResult<Ticket> {
        let req = ApiRequest::put(format!("{}/status", ticket_path(id))).json(&json!({ "status": status }))?;
        self.gateway.send_json(req).await
    }

    pub async fn update_support_level(&self, id: &str, level: SupportLevel) -> AppResult<Ticket> {
        let req = ApiRequest::put(format!("{}/support-level", ticket_path(id))).json(&json!({ "support_level": level }))?;
        self.gateway.send_json(req).await
    }

    pub async fn assign(&self, id: &str, user_id: &str, note: Option<&str>) -> AppResult<Ticket> {
        let mut body = json!({ "assigned_to_id": user_id });
        if let Some(n) = note {
            body["note"] = Value::String(n.to_string());
        }
        let req = ApiRequest::post(format!("{}/assign", admin_ticket_path(id))).json(&body)?;
        self.gateway.send_json(req).await
    }

    /// Owner deletion.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.gateway.send(ApiRequest::delete(ticket_path(id))).await.map(|_| ())
    }

    pub async fn admin_delete(&self, id: &str) -> AppResult<()> {
        self.gateway.send(ApiRequest::delete(admin_ticket_path(id))).await.map(|_| ())
    }

    pub async fn stats(&self) -> AppResult<Value> {
        self.gateway.send_json(ApiRequest::get("/tickets/stats/")).await
    }

    pub async fn stats_by_department(&self) -> AppResult<Value> {
        self.gateway.send_json(ApiRequest::get("/tickets/stats/department")).await
    }

    pub async fn stats_by_user(&self) -> AppResult<Value> {
        self.gateway.send_json(ApiRequest::get("/tickets/stats/user")).await
    }
}
