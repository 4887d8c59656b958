use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRef;

/// Comment entity - attached to exactly one post and one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author: UserRef,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Comment{{id={}, body='{}', creationDate={}, username={}}}",
            self.id,
            self.body,
            self.created_at.to_rfc3339(),
            self.author.username
        )
    }
}
