use serde::{Deserialize, Deserializer, Serialize};

use super::role::{normalize, Role};

/// The authenticated identity plus its normalized role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub department_id: Option<String>,
}

impl Principal {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_string() }
    }
}

/// `GET /auth/me` payload. The role arrives as free text and is normalized on conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "departmentId", deserialize_with = "de_opt_id")]
    pub department_id: Option<String>,
}

impl Profile {
    /// Rejects profiles without an identity; the caller treats that as malformed data.
    pub fn into_principal(self) -> Option<Principal> {
        if self.id.trim().is_empty() {
            return None;
        }
        Some(Principal {
            id: self.id,
            email: self.email,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            role: normalize(self.role.as_deref()),
            department_id: self.department_id,
        })
    }
}

// Backend ids are integers in some deployments and strings in others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(d)? {
        RawId::Num(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(|r| match r {
        RawId::Num(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}
