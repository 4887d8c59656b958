use std::fmt;

use serde::{Deserialize, Serialize};

/// Roles known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
}

impl Role {
    /// The authority name stored in the `authorities` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A granted authority (role name). Static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub id: i64,
    pub authority: String,
}

impl Authority {
    pub fn is(&self, role: Role) -> bool {
        self.authority == role.as_str()
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Authority{{id={}, authority={}}}", self.id, self.authority)
    }
}
