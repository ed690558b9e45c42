use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::principal::Principal;
use super::role::Role;
use super::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    View,
    Edit,
    Delete,
    Create,
    Assign,
    ChangeStatus,
    ChangeSupportLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Ticket,
    User,
    Department,
    Equipment,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Create => "create",
            Action::Assign => "assign",
            Action::ChangeStatus => "change the status of",
            Action::ChangeSupportLevel => "change the support level of",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Ticket => "ticket",
            ResourceType::User => "user",
            ResourceType::Department => "department",
            ResourceType::Equipment => "equipment",
        };
        f.write_str(s)
    }
}

/// Transient (action, resource, owner) tuple checked per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequest {
    pub action: Action,
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_owner_id: Option<String>,
}

impl CapabilityRequest {
    pub fn new(action: Action, resource_type: ResourceType) -> Self {
        Self { action, resource_type, resource_owner_id: None }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.resource_owner_id = Some(owner_id.into());
        self
    }
}

/// Decide whether `principal` may perform `req`. Pure; no principal means deny.
/// Anything not listed below is denied.
pub fn evaluate(principal: Option<&Principal>, req: &CapabilityRequest) -> bool {
    let Some(p) = principal else { return false; };
    if p.role == Role::Admin {
        return true;
    }
    let owns = req.resource_owner_id.as_deref().is_some_and(|owner| owner == p.id);
    match (req.action, req.resource_type) {
        (Action::View, ResourceType::Ticket)
        | (Action::View, ResourceType::Department)
        | (Action::View, ResourceType::Equipment) => true,
        (Action::View, ResourceType::User) => owns,
        (Action::Create, ResourceType::Ticket) => true,
        (Action::Edit | Action::Delete, ResourceType::Ticket | ResourceType::User) => owns,
        (Action::ChangeStatus | Action::ChangeSupportLevel, ResourceType::Ticket) => p.role == Role::Support,
        _ => false,
    }
}

/// Source of the current principal, injected into the evaluator.
pub trait PrincipalSource: Send + Sync {
    fn principal(&self) -> Option<Principal>;
}

impl PrincipalSource for SessionStore {
    fn principal(&self) -> Option<Principal> { SessionStore::principal(self) }
}

/// Evaluator bound to a principal accessor. Holds no state of its own.
#[derive(Clone)]
pub struct Authorizer {
    source: Arc<dyn PrincipalSource>,
}

impl Authorizer {
    pub fn new(source: Arc<dyn PrincipalSource>) -> Self { Self { source } }

    pub fn allows(&self, req: &CapabilityRequest) -> bool {
        evaluate(self.source.principal().as_ref(), req)
    }

    /// Like `allows`, but hands back the principal on success and an
    /// `Unauthorized` error on denial.
    pub fn require(&self, req: &CapabilityRequest) -> AppResult<Principal> {
        let principal = self.source.principal();
        if evaluate(principal.as_ref(), req) {
            if let Some(p) = principal {
                return Ok(p);
            }
        }
        let message = match principal {
            None => "sign in required".to_string(),
            Some(_) => format!("not permitted to {} this {}", req.action, req.resource_type),
        };
        tracing::debug!(target: "helpdesk", action = ?req.action, resource = ?req.resource_type, "authorization denied");
        Err(AppError::unauthorized("not_permitted".to_string(), message))
    }
}

#[cfg(test)]
#[path = "authorizer_tests.rs"]
mod authorizer_tests;
