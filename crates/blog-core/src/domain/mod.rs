//! Domain entities - the core business objects.

mod authority;
mod comment;
mod post;
mod principal;
mod user;
mod validation;

pub use authority::{Authority, Role};
pub use comment::Comment;
pub use post::{Post, PostDraft, PostFields, PostPage};
pub use principal::{ANONYMOUS_USERNAME, Principal};
pub use user::{BlogUser, Credentials, NewUser, UserRef};
pub use validation::{FieldError, validate};
