//! Post workflow - read, create, edit and delete posts.
//!
//! Every step starts with its guards and returns a typed outcome: the value a
//! page is rendered from, a [`Redirect`], or a [`DomainError`].

use std::sync::Arc;

use crate::domain::{Post, PostDraft, PostFields, PostPage, Principal, Role, validate};
use crate::error::{DomainError, RepoError};
use crate::policy::{ensure_owner, is_owner, require_role};
use crate::ports::{PostRepository, UserRepository};

/// Where the client should be sent after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect(pub String);

impl Redirect {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn location(&self) -> &str {
        &self.0
    }
}

/// Orchestrates the post pages over the repositories.
#[derive(Clone)]
pub struct PostWorkflow {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostWorkflow {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Most recent posts for the site root.
    pub async fn home(&self, limit: u64) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.find_recent(limit).await?)
    }

    /// Show a post. Open to anonymous readers.
    pub async fn view(&self, id: i64, principal: &Principal) -> Result<PostPage, DomainError> {
        let post = self.load(id).await?;
        let is_owner = is_owner(&post, principal);
        Ok(PostPage { post, is_owner })
    }

    /// Start a new post owned by the principal's account.
    pub async fn begin_create(&self, principal: &Principal) -> Result<PostDraft, DomainError> {
        require_role(principal, Role::User)?;

        let user = self
            .users
            .find_by_username(&principal.username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(username = %principal.username, "Principal has no user record");
                DomainError::Internal(format!(
                    "no user record for principal {}",
                    principal.username
                ))
            })?;

        Ok(PostDraft::new(user.to_ref()))
    }

    /// Store a draft started by [`begin_create`](Self::begin_create).
    pub async fn create(
        &self,
        principal: &Principal,
        draft: PostDraft,
    ) -> Result<Redirect, DomainError> {
        require_role(principal, Role::User)?;

        if draft.owner.username != principal.username {
            return Err(DomainError::Forbidden {
                resource: format!("a draft owned by {}", draft.owner.username),
                username: principal.username.clone(),
            });
        }

        validate(&draft).map_err(DomainError::Validation)?;

        let post = self.posts.insert(draft).await?;
        tracing::info!(post_id = post.id, username = %principal.username, "Post created");

        Ok(Redirect(post.location()))
    }

    /// Load a post the principal owns, for editing.
    pub async fn begin_edit(
        &self,
        id: i64,
        principal: &Principal,
    ) -> Result<PostDraft, DomainError> {
        require_role(principal, Role::User)?;

        let post = self.load(id).await?;
        ensure_owner(&post, principal)?;

        Ok(post.to_draft())
    }

    /// Save edited title and body. Owner and creation timestamp stay as stored.
    pub async fn submit_edit(
        &self,
        id: i64,
        principal: &Principal,
        fields: PostFields,
    ) -> Result<Redirect, DomainError> {
        require_role(principal, Role::User)?;

        let post = self.load(id).await?;
        ensure_owner(&post, principal)?;

        let draft = post.to_draft().with_fields(fields);
        validate(&draft).map_err(DomainError::Validation)?;

        let updated = self
            .posts
            .update(Post {
                title: draft.title,
                body: draft.body,
                ..post
            })
            .await
            .map_err(|e| not_found_or_internal(e, id))?;
        tracing::info!(post_id = updated.id, username = %principal.username, "Post updated");

        Ok(Redirect(updated.location()))
    }

    /// Delete a post the principal owns, together with its comments.
    pub async fn delete(&self, id: i64, principal: &Principal) -> Result<Redirect, DomainError> {
        require_role(principal, Role::User)?;

        let post = self.load(id).await?;
        ensure_owner(&post, principal)?;

        self.posts
            .delete(post.id)
            .await
            .map_err(|e| not_found_or_internal(e, id))?;
        tracing::info!(
            post_id = id,
            comments = post.comments.len(),
            username = %principal.username,
            "Post deleted"
        );

        Ok(Redirect::root())
    }

    async fn load(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Post",
                id,
            })
    }
}

/// A post that vanished between lookup and write is reported as missing.
fn not_found_or_internal(err: RepoError, id: i64) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: "Post",
            id,
        },
        other => other.into(),
    }
}
