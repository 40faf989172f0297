use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreatePieceRequest, Piece, PieceSearch, SearchParams},
    repo,
};
use crate::{error::ApiError, gateway::PropagatedIdentity, state::AppState};

pub fn piece_routes() -> Router<AppState> {
    Router::new()
        .route("/detail/:id", get(find_by_id))
        .route("/create", post(create))
        .route("/search", get(search))
        .route("/del/:piece_id", delete(delete_piece))
}

fn ensure_owner(piece: &Piece, identity: &PropagatedIdentity) -> Result<(), ApiError> {
    identity.require_owner(piece.owner_id, "Not the owner of this piece")
}

#[instrument(skip(state))]
pub async fn find_by_id(
    State(state): State<AppState>,
    _identity: PropagatedIdentity,
    Path(id): Path<i64>,
) -> Result<Json<Piece>, ApiError> {
    let piece = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Piece not found"))?;
    Ok(Json(piece))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Json(payload): Json<CreatePieceRequest>,
) -> Result<(StatusCode, Json<Piece>), ApiError> {
    payload.validate()?;
    let piece = repo::insert(&state.db, identity.user_id, &payload).await?;
    info!(piece_id = piece.id, owner_id = identity.user_id, "piece created");
    Ok((StatusCode::CREATED, Json(piece)))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Piece>>, ApiError> {
    let search = PieceSearch::try_from(params)?;
    let pieces = repo::search(&state.db, identity.user_id, &search).await?;
    Ok(Json(pieces))
}

#[instrument(skip(state))]
pub async fn delete_piece(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
    Path(piece_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let piece = repo::find_by_id(&state.db, piece_id)
        .await?
        .ok_or(ApiError::NotFound("Piece not found"))?;
    ensure_owner(&piece, &identity)?;
    repo::delete(&state.db, piece_id).await?;
    info!(piece_id, user_id = identity.user_id, "piece deleted");
    Ok(StatusCode::OK)
}
