use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validation::require_non_empty;
use super::{Comment, UserRef};

/// Post entity - a blog post with its owner and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    /// Assigned by storage at insert; never modified afterwards.
    pub created_at: DateTime<Utc>,
    pub owner: UserRef,
    pub comments: Vec<Comment>,
}

impl Post {
    /// Canonical location of this post.
    pub fn location(&self) -> String {
        format!("/post/{}", self.id)
    }

    /// Editable copy of this post.
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            id: Some(self.id),
            title: self.title.clone(),
            body: self.body.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Post{{id={}, title='{}', body='{}', creationDate={}, comments={} comments, user={}}}",
            self.id,
            self.title,
            self.body,
            self.created_at.to_rfc3339(),
            self.comments.len(),
            self.owner.username
        )
    }
}

/// A post being written or edited, handed from the "begin" step to the
/// "submit" step. `id` is `None` until the post is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostDraft {
    pub id: Option<i64>,
    #[validate(
        custom(function = "title_not_empty"),
        length(min = 7, message = "Title must be at least 7 characters long")
    )]
    pub title: String,
    #[validate(custom(function = "body_not_empty"))]
    pub body: String,
    pub owner: UserRef,
}

impl PostDraft {
    /// Empty draft owned by `owner`.
    pub fn new(owner: UserRef) -> Self {
        Self {
            id: None,
            title: String::new(),
            body: String::new(),
            owner,
        }
    }

    /// Bind submitted fields onto the draft.
    pub fn with_fields(mut self, fields: PostFields) -> Self {
        self.title = fields.title;
        self.body = fields.body;
        self
    }
}

fn title_not_empty(value: &str) -> Result<(), ValidationError> {
    require_non_empty(value, "Please enter the title")
}

fn body_not_empty(value: &str) -> Result<(), ValidationError> {
    require_non_empty(value, "Write something for the love of Internet...")
}

/// Title and body as submitted by the post form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// What the post page shows: the post and whether the viewer owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub post: Post,
    pub is_owner: bool,
}
