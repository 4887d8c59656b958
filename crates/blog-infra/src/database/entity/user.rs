//! User entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(column_name = "password")]
    pub password_hash: String,
    pub enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::authority::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_authority::Relation::Authority.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_authority::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reference form used by posts and comments.
    pub fn to_ref(&self) -> blog_core::domain::UserRef {
        blog_core::domain::UserRef {
            id: self.id,
            username: self.username.clone(),
        }
    }

    /// Domain user with the given authorities.
    pub fn into_domain(
        self,
        authorities: Vec<super::authority::Model>,
    ) -> blog_core::domain::BlogUser {
        blog_core::domain::BlogUser {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            enabled: self.enabled,
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }
}
