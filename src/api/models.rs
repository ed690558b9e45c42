//! Backend payloads. Ids may arrive as numbers or strings and are kept as strings;
//! timestamps may arrive without an offset and are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::identity::{de_id, de_opt_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Waiting,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Waiting,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Waiting => "WAITING",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Escalation tier: AI, expert, managerial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3")]
    Level3,
}

impl SupportLevel {
    pub const ALL: [SupportLevel; 3] = [SupportLevel::Level1, SupportLevel::Level2, SupportLevel::Level3];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportLevel::Level1 => "LEVEL_1",
            SupportLevel::Level2 => "LEVEL_2",
            SupportLevel::Level3 => "LEVEL_3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s) || (s.len() == 1 && l.as_str().ends_with(s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Hardware,
    Software,
    Network,
    Technical,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: TicketStatus,
    pub support_level: SupportLevel,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub department_id: Option<String>,
    #[serde(deserialize_with = "de_id")]
    pub created_by_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub assigned_to_id: Option<String>,
    #[serde(deserialize_with = "de_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "de_utc")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
}

/// Editable, non-workflow fields. Unset fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Account as listed by `/users`. The role is left raw here; only the signed-in
/// principal's role is normalized and it is the only one ever evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub department_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub department_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn de_utc<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(d)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|n| n.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket_json() -> Value {
        json!({
            "id": 12, "title": "Printer jam", "description": "3rd floor",
            "category": "HARDWARE", "priority": "HIGH", "status": "IN_PROGRESS",
            "support_level": "LEVEL_2", "department_id": 4, "created_by_id": 7,
            "assigned_to_id": null,
            "created_at": "2024-03-01T10:00:00", "updated_at": "2024-03-01T11:30:00.250Z"
        })
    }

    #[test]
    fn ticket_from_backend_shape() {
        let t: Ticket = serde_json::from_value(ticket_json()).unwrap();
        assert_eq!(t.id, "12");
        assert_eq!(t.created_by_id, "7");
        assert_eq!(t.department_id.as_deref(), Some("4"));
        assert_eq!(t.assigned_to_id, None);
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.support_level, SupportLevel::Level2);
        assert_eq!(t.category, Category::Hardware);
        assert_eq!(t.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(t.updated_at > t.created_at);
    }

    #[test]
    fn enums_use_backend_spelling() {
        assert_eq!(serde_json::to_value(TicketStatus::InProgress).unwrap(), json!("IN_PROGRESS"));
        assert_eq!(serde_json::to_value(SupportLevel::Level3).unwrap(), json!("LEVEL_3"));
        assert_eq!(TicketStatus::parse("resolved"), Some(TicketStatus::Resolved));
        assert_eq!(TicketStatus::parse("done"), None);
        assert_eq!(SupportLevel::parse("level_1"), Some(SupportLevel::Level1));
        assert_eq!(SupportLevel::parse("2"), Some(SupportLevel::Level2));
        assert_eq!(SupportLevel::parse("LEVEL_4"), None);
    }

    #[test]
    fn changes_skip_unset_fields() {
        let c = TicketChanges { title: Some("New title".into()), priority: Some(Priority::Low), ..Default::default() };
        assert_eq!(serde_json::to_value(&c).unwrap(), json!({"title": "New title", "priority": "LOW"}));
    }

    #[test]
    fn equipment_keeps_unknown_fields() {
        let e: Equipment = serde_json::from_value(json!({"id": 1, "name": "Laptop", "serial_number": "X1"})).unwrap();
        assert_eq!(e.extra.get("serial_number"), Some(&json!("X1")));
    }
}
