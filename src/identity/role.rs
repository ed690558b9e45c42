use serde::{Deserialize, Serialize};

/// Canonical role set. Anything the backend sends is folded into one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Support,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Support => "support",
            Role::User => "user",
        }
    }
}

/// Map a raw backend role string to a canonical role.
/// Unrecognized input degrades to `User`, never to `Admin`.
pub fn normalize(raw: Option<&str>) -> Role {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else { return Role::User; };
    if raw.eq_ignore_ascii_case("admin") {
        return Role::Admin;
    }
    if raw.to_uppercase().contains("ADMIN") {
        return Role::Admin;
    }
    match raw.to_lowercase().as_str() {
        "admin" => Role::Admin,
        "support" => Role::Support,
        _ => Role::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_empty_is_user() {
        assert_eq!(normalize(None), Role::User);
        assert_eq!(normalize(Some("")), Role::User);
    }

    #[test]
    fn admin_substring_in_any_case() {
        for raw in ["admin", "ADMIN", "Admin", "superadmin", "SYS_ADMIN", "administrator", "it-Admins"] {
            assert_eq!(normalize(Some(raw)), Role::Admin, "{raw}");
        }
    }

    #[test]
    fn canonical_values_lowercased() {
        assert_eq!(normalize(Some("support")), Role::Support);
        assert_eq!(normalize(Some("SUPPORT")), Role::Support);
        assert_eq!(normalize(Some("User")), Role::User);
    }

    #[test]
    fn unrecognized_degrades_to_user() {
        for raw in ["root", "manager", " support", "supporter", "agent", "  ", "ädmín"] {
            assert_eq!(normalize(Some(raw)), Role::User, "{raw}");
        }
    }
}
