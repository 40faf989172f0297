use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        validate_comment, ModifyCommentRequest, Share, ShareComment, ShareDetail, ShareRequest,
        WriteCommentRequest,
    },
    repo,
};
use crate::{error::ApiError, gateway::PropagatedIdentity, state::AppState};

pub fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shares).post(create_share))
        .route(
            "/:share_id",
            get(share_detail).put(update_share).delete(delete_share),
        )
        .route("/comment", post(write_comment))
        .route("/:share_id/comment", get(list_comments))
        .route(
            "/comment/:comment_id",
            put(modify_comment).delete(delete_comment),
        )
}

fn ensure_share_author(share: &Share, identity: &PropagatedIdentity) -> Result<(), ApiError> {
    identity.require_owner(share.author_id, "Not the author of this share")
}

fn ensure_comment_author(
    comment: &ShareComment,
    identity: &PropagatedIdentity,
) -> Result<(), ApiError> {
    identity.require_owner(comment.author_id, "Not the author of this comment")
}

async fn load_share(state: &AppState, share_id: i64) -> Result<Share, ApiError> {
    repo::find_by_id(&state.db, share_id)
        .await?
        .ok_or(ApiError::NotFound("Share not found"))
}

async fn load_own_comment(
    state: &AppState,
    comment_id: i64,
    identity: &PropagatedIdentity,
) -> Result<ShareComment, ApiError> {
    let comment = repo::find_comment(&state.db, comment_id)
        .await?
        .ok_or(ApiError::NotFound("Comment not found"))?;
    ensure_comment_author(&comment, identity)?;
    Ok(comment)
}

#[instrument(skip(state))]
pub async fn list_shares(
    State(state): State<AppState>,
    _identity: PropagatedIdentity,
) -> Result<Json<Vec<Share>>, ApiError> {
    Ok(Json(repo::list(&state.db).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_share(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Json(payload): Json<ShareRequest>,
) -> Result<(StatusCode, Json<Share>), ApiError> {
    payload.validate()?;
    let share = repo::insert(&state.db, identity.user_id, &payload).await?;
    info!(share_id = share.id, author_id = identity.user_id, "share created");
    Ok((StatusCode::CREATED, Json(share)))
}

#[instrument(skip(state))]
pub async fn share_detail(
    State(state): State<AppState>,
    _identity: PropagatedIdentity,
    Path(share_id): Path<i64>,
) -> Result<Json<ShareDetail>, ApiError> {
    let share = load_share(&state, share_id).await?;
    let comments = repo::comments_for(&state.db, share_id).await?;
    Ok(Json(ShareDetail { share, comments }))
}

#[instrument(skip(state, payload))]
pub async fn update_share(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Path(share_id): Path<i64>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Share>, ApiError> {
    payload.validate()?;
    let share = load_share(&state, share_id).await?;
    ensure_share_author(&share, &identity)?;
    Ok(Json(repo::update(&state.db, share_id, &payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_share(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Path(share_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let share = load_share(&state, share_id).await?;
    ensure_share_author(&share, &identity)?;
    repo::delete(&state.db, share_id).await?;
    info!(share_id, "share deleted");
    Ok(StatusCode::OK)
}

/// Writes a comment and answers with the share's whole thread.
#[instrument(skip(state, payload))]
pub async fn write_comment(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Json(payload): Json<WriteCommentRequest>,
) -> Result<(StatusCode, Json<Vec<ShareComment>>), ApiError> {
    validate_comment(&payload.content)?;
    load_share(&state, payload.share_id).await?;
    repo::insert_comment(&state.db, payload.share_id, identity.user_id, &payload.content).await?;
    let comments = repo::comments_for(&state.db, payload.share_id).await?;
    Ok((StatusCode::CREATED, Json(comments)))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    _identity: PropagatedIdentity,
    Path(share_id): Path<i64>,
) -> Result<Json<Vec<ShareComment>>, ApiError> {
    load_share(&state, share_id).await?;
    Ok(Json(repo::comments_for(&state.db, share_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn modify_comment(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Path(comment_id): Path<i64>,
    Json(payload): Json<ModifyCommentRequest>,
) -> Result<Json<ShareComment>, ApiError> {
    validate_comment(&payload.content)?;
    load_own_comment(&state, comment_id, &identity).await?;
    Ok(Json(
        repo::update_comment(&state.db, comment_id, &payload.content).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    load_own_comment(&state, comment_id, &identity).await?;
    repo::delete_comment(&state.db, comment_id).await?;
    info!(comment_id, "comment deleted");
    Ok(StatusCode::OK)
}
