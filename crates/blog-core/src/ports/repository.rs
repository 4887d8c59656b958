use async_trait::async_trait;

use crate::domain::{BlogUser, NewUser, Post, PostDraft};
use crate::error::RepoError;

/// User repository - lookups by identity and by the unique username.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id, with their authorities.
    async fn find_by_id(&self, id: i64) -> Result<Option<BlogUser>, RepoError>;

    /// Find a user by their unique username (case-sensitive).
    async fn find_by_username(&self, username: &str) -> Result<Option<BlogUser>, RepoError>;

    /// Store a new, enabled user and grant the requested roles.
    ///
    /// Fails with [`RepoError::Constraint`] when the username is taken.
    async fn create(&self, user: NewUser) -> Result<BlogUser, RepoError>;
}

/// Post repository. Posts are loaded together with their owner and comments.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Most recent posts first, at most `limit` of them.
    async fn find_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Insert a draft; storage assigns the id and creation timestamp.
    async fn insert(&self, draft: PostDraft) -> Result<Post, RepoError>;

    /// Overwrite title and body. Owner and creation timestamp are left as stored.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    /// Delete a post and all of its comments as one unit of work.
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}
