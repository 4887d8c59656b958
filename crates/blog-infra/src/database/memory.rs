//! In-memory store - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use blog_core::domain::{Authority, BlogUser, Comment, NewUser, Post, PostDraft, Role, UserRef};
use blog_core::error::RepoError;
use blog_core::ports::{PostRepository, UserRepository};

/// Generated ids start here; lower ids are reserved for seed data.
const FIRST_GENERATED_ID: i64 = 10;

struct UserRow {
    username: String,
    password_hash: String,
    enabled: bool,
    authority_ids: Vec<i64>,
}

struct PostRow {
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    user_id: i64,
}

struct CommentRow {
    body: String,
    created_at: DateTime<Utc>,
    post_id: i64,
    user_id: i64,
}

struct Tables {
    users: BTreeMap<i64, UserRow>,
    authorities: BTreeMap<i64, Authority>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    sequences: Sequences,
}

/// One id sequence per table.
struct Sequences {
    users: i64,
    posts: i64,
    comments: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    let id = *sequence;
    *sequence += 1;
    id
}

impl Tables {
    fn user_ref(&self, id: i64) -> Result<UserRef, RepoError> {
        self.users
            .get(&id)
            .map(|row| UserRef {
                id,
                username: row.username.clone(),
            })
            .ok_or_else(|| RepoError::Query(format!("user {} missing", id)))
    }

    fn user(&self, id: i64, row: &UserRow) -> BlogUser {
        BlogUser {
            id,
            username: row.username.clone(),
            password_hash: row.password_hash.clone(),
            enabled: row.enabled,
            authorities: row
                .authority_ids
                .iter()
                .filter_map(|a| self.authorities.get(a).cloned())
                .collect(),
        }
    }

    fn post(&self, id: i64, row: &PostRow) -> Result<Post, RepoError> {
        let comments = self
            .comments
            .iter()
            .filter(|(_, c)| c.post_id == id)
            .map(|(comment_id, c)| {
                Ok(Comment {
                    id: *comment_id,
                    body: c.body.clone(),
                    created_at: c.created_at,
                    post_id: id,
                    author: self.user_ref(c.user_id)?,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(Post {
            id,
            title: row.title.clone(),
            body: row.body.clone(),
            created_at: row.created_at,
            owner: self.user_ref(row.user_id)?,
            comments,
        })
    }
}

/// In-memory implementation of every repository port, behind one async RwLock.
///
/// Each write holds the lock for its whole duration, so a post and its
/// comments are removed together.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Empty store seeded with the `ROLE_USER` authority.
    pub fn new() -> Self {
        let mut authorities = BTreeMap::new();
        authorities.insert(
            1,
            Authority {
                id: 1,
                authority: Role::User.as_str().to_string(),
            },
        );

        Self {
            tables: RwLock::new(Tables {
                users: BTreeMap::new(),
                authorities,
                posts: BTreeMap::new(),
                comments: BTreeMap::new(),
                sequences: Sequences {
                    users: FIRST_GENERATED_ID,
                    posts: FIRST_GENERATED_ID,
                    comments: FIRST_GENERATED_ID,
                },
            }),
        }
    }

    /// Attach a comment to an existing post. Used to seed data.
    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&post_id) {
            return Err(RepoError::Constraint(format!("post {} does not exist", post_id)));
        }
        let author = tables.user_ref(author_id)?;
        if body.is_empty() {
            return Err(RepoError::Constraint("comment body is empty".to_string()));
        }

        let id = next_id(&mut tables.sequences.comments);
        let created_at = Utc::now();
        tables.comments.insert(
            id,
            CommentRow {
                body: body.to_string(),
                created_at,
                post_id,
                user_id: author_id,
            },
        );

        Ok(Comment {
            id,
            body: body.to_string(),
            created_at,
            post_id,
            author,
        })
    }

    /// Number of stored comments, across all posts.
    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }

    /// Enable or disable an account.
    pub async fn set_enabled(&self, user_id: i64, enabled: bool) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let row = tables.users.get_mut(&user_id).ok_or(RepoError::NotFound)?;
        row.enabled = enabled;
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<BlogUser>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|row| tables.user(id, row)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<BlogUser>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(_, row)| row.username == username)
            .map(|(id, row)| tables.user(*id, row)))
    }

    async fn create(&self, user: NewUser) -> Result<BlogUser, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|row| row.username == user.username) {
            return Err(RepoError::Constraint(format!(
                "username {} already exists",
                user.username
            )));
        }

        let mut authority_ids = Vec::with_capacity(user.roles.len());
        for role in &user.roles {
            let found = tables
                .authorities
                .values()
                .find(|a| a.is(*role))
                .ok_or_else(|| RepoError::Constraint(format!("unknown authority {}", role)))?;
            authority_ids.push(found.id);
        }

        let id = next_id(&mut tables.sequences.users);
        let row = UserRow {
            username: user.username,
            password_hash: user.password_hash,
            enabled: true,
            authority_ids,
        };
        let created = tables.user(id, &row);
        tables.users.insert(id, row);

        Ok(created)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|row| tables.post(id, row))
            .transpose()
    }

    async fn find_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<(&i64, &PostRow)> = tables.posts.iter().collect();
        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.created_at.cmp(&a.created_at).then_with(|| b_id.cmp(a_id))
        });

        rows.into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(id, row)| tables.post(*id, row))
            .collect()
    }

    async fn insert(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&draft.owner.id) {
            return Err(RepoError::Constraint(format!(
                "user {} does not exist",
                draft.owner.id
            )));
        }

        let id = next_id(&mut tables.sequences.posts);
        let row = PostRow {
            title: draft.title,
            body: draft.body,
            created_at: Utc::now(),
            user_id: draft.owner.id,
        };
        let post = tables.post(id, &row)?;
        tables.posts.insert(id, row);

        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        let row = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        row.title = post.title;
        row.body = post.body;

        let row = &tables.posts[&post.id];
        tables.post(post.id, row)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        tables.posts.remove(&id);

        Ok(())
    }
}
