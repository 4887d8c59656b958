//! Post pages.
//!
//! Reads answer with the page to render; writes answer `303 See Other`
//! pointing at the page to load next.

use actix_web::{HttpResponse, http::header, web};

use blog_core::domain::{Comment, Post, PostDraft, PostFields, UserRef};
use blog_core::workflow::Redirect;
use blog_shared::dto::{
    CommentResponse, HomeResponse, PostFormBody, PostFormResponse, PostPageResponse, PostResponse,
    PostSummary, UserSummary,
};

use crate::middleware::auth::CurrentPrincipal;
use crate::middleware::error::{AppError, AppResult, view};
use crate::state::AppState;

fn user_summary(user: &UserRef) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username.clone(),
    }
}

fn comment_response(comment: &Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        body: comment.body.clone(),
        creation_date: comment.created_at,
        user: user_summary(&comment.author),
    }
}

fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title.clone(),
        body: post.body.clone(),
        creation_date: post.created_at,
        user: user_summary(&post.owner),
        comments: post.comments.iter().map(comment_response).collect(),
    }
}

fn form_body(draft: &PostDraft) -> PostFormBody {
    PostFormBody {
        id: draft.id,
        title: draft.title.clone(),
        body: draft.body.clone(),
        user: user_summary(&draft.owner),
    }
}

fn form_page(draft: &PostDraft) -> PostFormResponse {
    PostFormResponse {
        view: view::POST_FORM.to_string(),
        post: form_body(draft),
    }
}

fn form_json(draft: &PostDraft) -> serde_json::Value {
    serde_json::to_value(form_body(draft)).unwrap_or(serde_json::Value::Null)
}

fn see_other(redirect: &Redirect) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, redirect.location()))
        .finish()
}

/// GET /
pub async fn home(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state
        .workflow
        .home(state.home_page_size)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(HomeResponse {
        view: view::HOME.to_string(),
        posts: posts
            .iter()
            .map(|post| PostSummary {
                id: post.id,
                title: post.title.clone(),
                creation_date: post.created_at,
                user: user_summary(&post.owner),
                comment_count: post.comments.len(),
            })
            .collect(),
    }))
}

/// GET /post/{id}
pub async fn view_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let page = state
        .workflow
        .view(id, &principal)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(PostPageResponse {
        view: view::POST.to_string(),
        post: post_response(&page.post),
        is_owner: page.is_owner,
    }))
}

/// GET /createNewPost
pub async fn new_post_form(
    state: web::Data<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> AppResult<HttpResponse> {
    let draft = state
        .workflow
        .begin_create(&principal)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR))?;

    Ok(HttpResponse::Ok().json(form_page(&draft)))
}

/// POST /createNewPost
pub async fn create_post(
    state: web::Data<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    form: web::Form<PostFields>,
) -> AppResult<HttpResponse> {
    let draft = state
        .workflow
        .begin_create(&principal)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR))?
        .with_fields(form.into_inner());
    let submitted = form_json(&draft);

    let redirect = state
        .workflow
        .create(&principal, draft)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR).with_form(submitted))?;

    Ok(see_other(&redirect))
}

/// GET /editPost/{id}
pub async fn edit_post_form(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> AppResult<HttpResponse> {
    let draft = state
        .workflow
        .begin_edit(path.into_inner(), &principal)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR))?;

    Ok(HttpResponse::Ok().json(form_page(&draft)))
}

/// POST /editPost/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    CurrentPrincipal(principal): CurrentPrincipal,
    form: web::Form<PostFields>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let fields = form.into_inner();
    let submitted = serde_json::json!({
        "id": id,
        "title": fields.title,
        "body": fields.body,
    });

    let redirect = state
        .workflow
        .submit_edit(id, &principal, fields)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR).with_form(submitted))?;

    Ok(see_other(&redirect))
}

/// POST /deletePost/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> AppResult<HttpResponse> {
    let redirect = state
        .workflow
        .delete(path.into_inner(), &principal)
        .await
        .map_err(|e| AppError::from_domain(e, &principal, view::ERROR))?;

    Ok(see_other(&redirect))
}
