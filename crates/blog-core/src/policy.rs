//! Authorization guards composed at the start of each workflow step.
//!
//! The role gate runs before any lookup. The ownership gate runs only after
//! the post is known to exist, so a missing post reports `NotFound` and an
//! existing post owned by someone else reports `Forbidden`.

use crate::domain::{Post, Principal, Role};
use crate::error::DomainError;

/// Reject principals that do not hold `role`.
pub fn require_role(principal: &Principal, role: Role) -> Result<(), DomainError> {
    if principal.has_role(role) {
        Ok(())
    } else {
        tracing::debug!(username = %principal.username, role = %role, "Role gate rejected principal");
        Err(DomainError::Unauthorized(role))
    }
}

/// Whether `principal` owns `post`. Exact, case-sensitive username match.
pub fn is_owner(post: &Post, principal: &Principal) -> bool {
    post.owner.username == principal.username
}

/// Reject principals that do not own `post`.
pub fn ensure_owner(post: &Post, principal: &Principal) -> Result<(), DomainError> {
    if is_owner(post, principal) {
        Ok(())
    } else {
        Err(DomainError::Forbidden {
            resource: format!("Post {}", post.id),
            username: principal.username.clone(),
        })
    }
}
