use serde::{Deserialize, Serialize};

use crate::models::lenient::null_as_default;

pub const ROLE_SUPER_ADMIN: &str = "super-admin";
pub const ROLE_DATA_ENTRY: &str = "data-entry";

/// Anything that isn't exactly `super-admin` is a regular account.
pub fn normalize_role(role: &str) -> &'static str {
    if role == ROLE_SUPER_ADMIN {
        ROLE_SUPER_ADMIN
    } else {
        ROLE_DATA_ENTRY
    }
}

/// The local part of the email doubles as the storage username.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub student_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn username(&self) -> String {
        username_from_email(&self.email)
    }

    /// Records written before roles existed only carry `isAdmin`.
    pub fn effective_role(&self) -> &'static str {
        match self.role.as_deref() {
            Some(role) => normalize_role(role),
            None if self.is_admin => ROLE_SUPER_ADMIN,
            None => ROLE_DATA_ENTRY,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.effective_role() == ROLE_SUPER_ADMIN || self.is_admin
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.username()
        } else {
            self.name.clone()
        }
    }

    pub fn set_role(&mut self, role: &str) {
        let role = normalize_role(role);
        self.role = Some(role.to_string());
        self.is_admin = role == ROLE_SUPER_ADMIN;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<User>,
}

impl UserList {
    pub fn next_id(&self) -> u64 {
        self.users.iter().map(|u| u.id).max().map(|m| m + 1).unwrap_or(1)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Non-admin accounts with a usable username.
    pub fn students(&self) -> impl Iterator<Item = &User> {
        self.users
            .iter()
            .filter(|u| !u.username().is_empty() && !u.is_super_admin())
    }
}
