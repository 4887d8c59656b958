use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validation::require_non_empty;
use super::{ANONYMOUS_USERNAME, Authority, Role};

/// A registered account.
///
/// The password hash is skipped on serialization and never formatted.
#[derive(Clone, Serialize, Deserialize)]
pub struct BlogUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub enabled: bool,
    pub authorities: Vec<Authority>,
}

impl BlogUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.authorities.iter().any(|a| a.is(role))
    }

    /// Role names, in the form carried by tokens and principals.
    pub fn role_names(&self) -> Vec<String> {
        self.authorities.iter().map(|a| a.authority.clone()).collect()
    }

    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

impl fmt::Debug for BlogUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("enabled", &self.enabled)
            .field("authorities", &self.authorities)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for BlogUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles = self.role_names().join(",");
        write!(
            f,
            "BlogUser{{id={}, username={}, enabled={}, authorities=[{}]}}",
            self.id, self.username, self.enabled, roles
        )
    }
}

/// Lightweight reference to a user, as held by posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

/// A user about to be stored. The password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Username/password pair submitted at registration.
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(
        custom(function = "username_not_empty"),
        custom(function = "username_not_reserved"),
        length(
            min = 3,
            message = "Username must be at least 3 characters long"
        )
    )]
    pub username: String,
    #[validate(
        custom(function = "password_not_empty"),
        length(
            min = 8,
            message = "Password must be at least 8 characters long"
        )
    )]
    pub password: String,
}

fn username_not_empty(value: &str) -> Result<(), ValidationError> {
    require_non_empty(value, "Please enter username")
}

fn username_not_reserved(value: &str) -> Result<(), ValidationError> {
    if value == ANONYMOUS_USERNAME {
        let mut err = ValidationError::new("reserved");
        err.message = Some("This username is reserved".into());
        return Err(err);
    }
    Ok(())
}

fn password_not_empty(value: &str) -> Result<(), ValidationError> {
    require_non_empty(value, "Please enter the password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate;

    fn user() -> BlogUser {
        BlogUser {
            id: 10,
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            enabled: true,
            authorities: vec![Authority {
                id: 10,
                authority: "ROLE_USER".to_string(),
            }],
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_password_hash_never_formatted() {
        let user = user();
        assert!(!format!("{:?}", user).contains("argon2"));
        assert!(!format!("{}", user).contains("argon2"));
    }

    #[test]
    fn test_has_role() {
        assert!(user().has_role(Role::User));
        let mut without = user();
        without.authorities.clear();
        assert!(!without.has_role(Role::User));
    }

    #[test]
    fn test_credentials_rules() {
        let ok = Credentials {
            username: "bob".to_string(),
            password: "longenough".to_string(),
        };
        assert!(validate(&ok).is_ok());

        let short = Credentials {
            username: "bo".to_string(),
            password: "short".to_string(),
        };
        let errors = validate(&short).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["password", "username"]);
    }

    #[test]
    fn test_password_length_boundary() {
        let exact = Credentials {
            username: "bob".to_string(),
            password: "12345678".to_string(),
        };
        assert!(validate(&exact).is_ok());

        let one_short = Credentials {
            password: "1234567".to_string(),
            ..exact
        };
        let errors = validate(&one_short).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Password must be at least 8 characters long");
    }

    #[test]
    fn test_anonymous_username_is_reserved() {
        let creds = Credentials {
            username: ANONYMOUS_USERNAME.to_string(),
            password: "longenough".to_string(),
        };
        let errors = validate(&creds).unwrap_err();
        assert!(errors.iter().any(|e| e.message == "This username is reserved"));
    }
}
