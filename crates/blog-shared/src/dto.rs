//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub enabled: bool,
    pub roles: Vec<String>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Author or owner as shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub body: String,
    pub creation_date: DateTime<Utc>,
    pub user: UserSummary,
}

/// A post with its owner and comments, oldest comment first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub creation_date: DateTime<Utc>,
    pub user: UserSummary,
    pub comments: Vec<CommentResponse>,
}

/// The `post` page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageResponse {
    pub view: String,
    pub post: PostResponse,
    pub is_owner: bool,
}

/// Contents of the post form. `id` is absent for a post not stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    pub user: UserSummary,
}

/// The `postForm` page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    pub view: String,
    pub post: PostFormBody,
}

/// One entry of the home page listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub creation_date: DateTime<Utc>,
    pub user: UserSummary,
    pub comment_count: usize,
}

/// The home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub view: String,
    pub posts: Vec<PostSummary>,
}
