//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;

use blog_core::domain::{Comment, Post};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub creation_date: DateTimeWithTimeZone,
    pub user_id: i64,
}

// Comments are removed explicitly by the repository before their post,
// so no ON DELETE action is declared here.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the domain post from its row, owner row and loaded comments.
    pub fn into_domain(self, owner: &super::user::Model, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            title: self.title,
            body: self.body,
            created_at: self.creation_date.into(),
            owner: owner.to_ref(),
            comments,
        }
    }
}
