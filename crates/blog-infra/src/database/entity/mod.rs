//! SeaORM entities for the blog schema.

pub mod authority;
pub mod comment;
pub mod post;
pub mod user;
pub mod user_authority;
