//! Authentication handlers.

use actix_web::{HttpResponse, web};

use blog_core::domain::{BlogUser, Credentials, NewUser, Role, validate};
use blog_core::error::RepoError;
use blog_core::ports::AuthError;
use blog_shared::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn user_response(user: &BlogUser) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        enabled: user.enabled,
        roles: user.role_names(),
    }
}

fn auth_response(state: &AppState, user: &BlogUser) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.role_names())?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(state.tokens.expiration_seconds()).unwrap_or(0),
        user: user_response(user),
    })
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_password(state: &AppState, password: String) -> AppResult<String> {
    let passwords = state.passwords.clone();
    web::block(move || passwords.hash(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

async fn verify_password(state: &AppState, password: String, hash: String) -> AppResult<bool> {
    let passwords = state.passwords.clone();
    web::block(move || passwords.verify(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let credentials = Credentials {
        username: req.username,
        password: req.password,
    };

    validate(&credentials).map_err(|errors| AppError::Validation {
        errors,
        view: None,
        form: None,
    })?;

    if state
        .users
        .find_by_username(&credentials.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = hash_password(&state, credentials.password).await?;

    let user = state
        .users
        .create(NewUser {
            username: credentials.username,
            password_hash,
            roles: vec![Role::User],
        })
        .await
        .map_err(|e| match e {
            // Lost a race with another registration
            RepoError::Constraint(_) => AppError::Conflict("Username already taken".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(auth_response(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let Some(user) = state.users.find_by_username(&req.username).await? else {
        tracing::debug!(username = %req.username, "Login for unknown user");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&state, req.password, user.password_hash.clone()).await? {
        tracing::debug!(username = %user.username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    if !user.enabled {
        return Err(AuthError::AccountDisabled.into());
    }

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(HttpResponse::Ok().json(auth_response(&state, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}
