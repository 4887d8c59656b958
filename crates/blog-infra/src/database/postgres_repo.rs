//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, Unchanged,
};

use blog_core::domain::{BlogUser, Comment, NewUser, Post, PostDraft};
use blog_core::error::RepoError;
use blog_core::ports::{PostRepository, UserRepository};

use super::entity::authority::{self, Entity as AuthorityEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::user_authority;

fn map_db_err(e: DbErr) -> RepoError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(e.to_string()),
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        other => {
            let err_str = other.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Constraint(err_str)
            } else {
                RepoError::Query(err_str)
            }
        }
    }
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn first_user(rows: Vec<(user::Model, Vec<authority::Model>)>) -> Option<BlogUser> {
    rows.into_iter()
        .next()
        .map(|(model, authorities)| model.into_domain(authorities))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<BlogUser>, RepoError> {
        let rows = UserEntity::find_by_id(id)
            .find_with_related(AuthorityEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(first_user(rows))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<BlogUser>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let rows = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .find_with_related(AuthorityEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(first_user(rows))
    }

    async fn create(&self, new_user: NewUser) -> Result<BlogUser, RepoError> {
        let role_names: Vec<&str> = new_user.roles.iter().map(|r| r.as_str()).collect();

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let authorities = AuthorityEntity::find()
            .filter(authority::Column::Authority.is_in(role_names.clone()))
            .all(&txn)
            .await
            .map_err(map_db_err)?;
        if authorities.len() != role_names.len() {
            return Err(RepoError::Constraint(format!(
                "unknown authority among {:?}",
                role_names
            )));
        }

        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            enabled: Set(true),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        for granted in &authorities {
            user_authority::ActiveModel {
                user_id: Set(model.id),
                authority_id: Set(granted.id),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::info!(user_id = model.id, username = %model.username, "User created");

        Ok(model.into_domain(authorities))
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Comments of the given posts with their authors, oldest first, grouped by post.
    async fn comments_for(
        &self,
        post_ids: Vec<i64>,
    ) -> Result<HashMap<i64, Vec<Comment>>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.is_in(post_ids))
            .find_also_related(UserEntity)
            .order_by_asc(comment::Column::CreationDate)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
        for (model, author) in rows {
            let author = author.ok_or_else(|| {
                RepoError::Query(format!("comment {} has no author", model.id))
            })?;
            grouped
                .entry(model.post_id)
                .or_default()
                .push(model.into_domain(&author));
        }
        Ok(grouped)
    }
}

fn with_owner(
    row: (post::Model, Option<user::Model>),
) -> Result<(post::Model, user::Model), RepoError> {
    let (model, owner) = row;
    match owner {
        Some(owner) => Ok((model, owner)),
        None => Err(RepoError::Query(format!("post {} has no owner", model.id))),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let (model, owner) = with_owner(row)?;
        let mut comments = self.comments_for(vec![model.id]).await?;
        let comments = comments.remove(&model.id).unwrap_or_default();

        Ok(Some(model.into_domain(&owner, comments)))
    }

    async fn find_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .order_by_desc(post::Column::CreationDate)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let ids = rows.iter().map(|(p, _)| p.id).collect();
        let mut comments = self.comments_for(ids).await?;

        rows.into_iter()
            .map(|row| {
                let (model, owner) = with_owner(row)?;
                let post_comments = comments.remove(&model.id).unwrap_or_default();
                Ok(model.into_domain(&owner, post_comments))
            })
            .collect()
    }

    async fn insert(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            id: NotSet,
            title: Set(draft.title),
            body: Set(draft.body),
            creation_date: Set(Utc::now().into()),
            user_id: Set(draft.owner.id),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(Post {
            id: model.id,
            title: model.title,
            body: model.body,
            created_at: model.creation_date.into(),
            owner: draft.owner,
            comments: Vec::new(),
        })
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        // creation_date and user_id stay NotSet so the UPDATE never touches them.
        let model = post::ActiveModel {
            id: Unchanged(post.id),
            title: Set(post.title),
            body: Set(post.body),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(Post {
            id: model.id,
            title: model.title,
            body: model.body,
            created_at: model.creation_date.into(),
            owner: post.owner,
            comments: post.comments,
        })
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let removed_comments = CommentEntity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(
            post_id = id,
            comments = removed_comments.rows_affected,
            "Post and comments deleted"
        );

        Ok(())
    }
}
