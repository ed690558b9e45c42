//! Ticket workflow engine: status, support level and assignment changes.
//!
//! Each change is checked by the evaluator first (denial never reaches the
//! network), then sent to the backend, and only the confirmed response is merged
//! into the local projection. Nothing is applied optimistically.

mod projection;
mod transitions;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{NewTicket, SupportLevel, Ticket, TicketChanges, TicketFilter, TicketStatus, TicketsApi};
use crate::error::{AppError, AppResult};
use crate::identity::{Action, Authorizer, CapabilityRequest, ResourceType};

pub use projection::{Applied, FieldGroup, Projection, RequestTag};
pub use transitions::TransitionPolicy;

#[derive(Clone)]
pub struct TicketWorkflow {
    api: TicketsApi,
    authz: Authorizer,
    policy: TransitionPolicy,
    projection: Arc<Mutex<Projection>>,
}

fn ticket_cap(action: Action, ticket: Option<&Ticket>) -> CapabilityRequest {
    let req = CapabilityRequest::new(action, ResourceType::Ticket);
    match ticket {
        Some(t) => req.owned_by(t.created_by_id.clone()),
        None => req,
    }
}

impl TicketWorkflow {
    pub fn new(api: TicketsApi, authz: Authorizer, policy: TransitionPolicy) -> Self {
        Self { api, authz, policy, projection: Arc::new(Mutex::new(Projection::new())) }
    }

    pub fn policy(&self) -> TransitionPolicy { self.policy }

    pub fn snapshot(&self, id: &str) -> Option<Ticket> { self.projection.lock().get(id) }

    pub fn tickets(&self) -> Vec<Ticket> { self.projection.lock().tickets() }

    /// Start tracking a ticket obtained elsewhere.
    pub fn track(&self, ticket: Ticket) {
        let mut p = self.projection.lock();
        let seq = p.next_seq();
        p.upsert(seq, ticket);
    }

    /// The UI no longer shows this ticket; pending completions for it are dropped.
    pub fn release(&self, id: &str) -> bool { self.projection.lock().release(id) }

    fn tracked(&self, id: &str) -> AppResult<Ticket> {
        self.projection
            .lock()
            .get(id)
            .ok_or_else(|| AppError::not_found("ticket_not_open".to_string(), format!("ticket {} is not open", id)))
    }

    fn merge(&self, tag: Option<&RequestTag>, confirmed: &Ticket) {
        let Some(tag) = tag else { return; };
        match self.projection.lock().apply(tag, confirmed) {
            Applied::Applied => {}
            outcome => debug!(target: "helpdesk", ticket = %tag.ticket_id, group = ?tag.group, seq = tag.seq, ?outcome, "response not applied"),
        }
    }

    pub async fn load(&self, filter: &TicketFilter) -> AppResult<Vec<Ticket>> {
        self.authz.require(&ticket_cap(Action::View, None))?;
        let seq = self.projection.lock().next_seq();
        let tickets = self.api.list(filter).await?;
        let mut p = self.projection.lock();
        for t in &tickets {
            p.upsert(seq, t.clone());
        }
        Ok(tickets)
    }

    pub async fn open(&self, id: &str) -> AppResult<Ticket> {
        self.authz.require(&ticket_cap(Action::View, None))?;
        let seq = self.projection.lock().next_seq();
        let ticket = self.api.get(id).await?;
        self.projection.lock().upsert(seq, ticket.clone());
        Ok(ticket)
    }

    pub async fn create(&self, new_ticket: &NewTicket) -> AppResult<Ticket> {
        self.authz.require(&ticket_cap(Action::Create, None))?;
        let ticket = self.api.create(new_ticket).await?;
        info!(target: "helpdesk", ticket = %ticket.id, "ticket created");
        self.track(ticket.clone());
        Ok(ticket)
    }

    pub async fn update(&self, id: &str, changes: &TicketChanges) -> AppResult<Ticket> {
        let current = self.tracked(id)?;
        self.authz.require(&ticket_cap(Action::Edit, Some(&current)))?;
        let tag = self.projection.lock().tag(id, FieldGroup::Details);
        let confirmed = self.api.update(id, changes).await?;
        self.merge(tag.as_ref(), &confirmed);
        Ok(confirmed)
    }

    pub async fn change_status(&self, id: &str, status: TicketStatus) -> AppResult<Ticket> {
        let current = self.tracked(id)?;
        self.authz.require(&ticket_cap(Action::ChangeStatus, Some(&current)))?;
        if !self.policy.allows(current.status, status) {
            return Err(AppError::validation(
                "invalid_transition".to_string(),
                format!("a ticket cannot move from {} to {}", current.status.as_str(), status.as_str()),
            ));
        }
        let tag = self.projection.lock().tag(id, FieldGroup::Status);
        let confirmed = self.api.update_status(id, status).await?;
        info!(target: "helpdesk", ticket = %id, from = current.status.as_str(), to = confirmed.status.as_str(), "status changed");
        self.merge(tag.as_ref(), &confirmed);
        Ok(confirmed)
    }

    pub async fn change_support_level(&self, id: &str, level: SupportLevel) -> AppResult<Ticket> {
        let current = self.tracked(id)?;
        self.authz.require(&ticket_cap(Action::ChangeSupportLevel, Some(&current)))?;
        let tag = self.projection.lock().tag(id, FieldGroup::SupportLevel);
        let confirmed = self.api.update_support_level(id, level).await?;
        info!(target: "helpdesk", ticket = %id, from = current.support_level.as_str(), to = confirmed.support_level.as_str(), "support level changed");
        self.merge(tag.as_ref(), &confirmed);
        Ok(confirmed)
    }

    /// Assign a ticket. The assignee recorded locally is the one the server
    /// confirms, which may differ from `user_id`.
    pub async fn assign(&self, id: &str, user_id: &str, note: Option<&str>) -> AppResult<Ticket> {
        let current = self.snapshot(id);
        self.authz.require(&ticket_cap(Action::Assign, current.as_ref()))?;
        let tag = self.projection.lock().tag(id, FieldGroup::Assignment);
        let confirmed = self.api.assign(id, user_id, note).await?;
        info!(target: "helpdesk", ticket = %id, assignee = ?confirmed.assigned_to_id, "ticket assigned");
        self.merge(tag.as_ref(), &confirmed);
        Ok(confirmed)
    }

    /// Delete on the server, then drop locally. Owners use the owner endpoint,
    /// anyone else who passes the check uses the admin one.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let current = self.tracked(id)?;
        let principal = self.authz.require(&ticket_cap(Action::Delete, Some(&current)))?;
        let tag = self.projection.lock().tag(id, FieldGroup::Details);
        if principal.id == current.created_by_id {
            self.api.delete(id).await?;
        } else {
            self.api.admin_delete(id).await?;
        }
        info!(target: "helpdesk", ticket = %id, "ticket deleted");
        if let Some(tag) = tag {
            self.projection.lock().remove(&tag);
        }
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<Value> {
        self.authz.require(&ticket_cap(Action::View, None))?;
        self.api.stats().await
    }

    pub async fn stats_by_department(&self) -> AppResult<Value> {
        self.authz.require(&ticket_cap(Action::View, None))?;
        self.api.stats_by_department().await
    }

    pub async fn stats_by_user(&self) -> AppResult<Value> {
        self.authz.require(&ticket_cap(Action::View, None))?;
        self.api.stats_by_user().await
    }
}
