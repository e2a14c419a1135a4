//! Registration data and the fixed worksheet layouts it is written to.

pub mod content;
pub mod layout;
pub mod shift;
pub mod team;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRole {
    pub id: u64,
    pub name: String,
}

/// Guild member submitting a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registrant {
    pub username: String,
    pub display_name: String,
    pub roles: Vec<MemberRole>,
}

impl Registrant {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<MemberRole>) -> Self {
        self.roles = roles;
        self
    }

    /// Names of the roles whose IDs are in `role_ids`, in the member's order.
    pub fn role_names_in(&self, role_ids: &[i64]) -> Vec<String> {
        self.roles
            .iter()
            .filter(|role| role_ids.contains(&(role.id as i64)))
            .map(|role| role.name.clone())
            .collect()
    }
}

/// Formats a number for a cell. Display rounding is left to the sheet.
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}
