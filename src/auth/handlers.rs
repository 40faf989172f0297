use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    claims::UserType,
    dto::{
        BusinessQuery, EmailQuery, EnterpriseUser, LoginRequest, LoginResponse, MessageResponse,
        PublicUser, SignupRequest,
    },
    services::{AuthService, Signup},
};
use crate::{
    error::ApiError,
    gateway::{bearer_token, bearer_value, PropagatedIdentity, REFRESH_AUTHORIZATION},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/emailcheck", get(email_check))
        .route("/businesscheck", get(business_check))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// Routes that read the propagated identity; mounted behind the edge.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_users))
        .route("/user", get(get_user))
        .route("/enteruser", get(get_enter_user))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = AuthService::from_state(&state)
        .signup(Signup {
            email: payload.email,
            password: payload.password,
            nickname: payload.nickname,
            user_type: payload.user_type,
            business_code: payload.business_code,
        })
        .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn email_check(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    AuthService::from_state(&state).check_email(&q.email).await?;
    Ok(Json(MessageResponse {
        message: "Email available",
    }))
}

#[instrument(skip(state))]
pub async fn business_check(
    State(state): State<AppState>,
    Query(q): Query<BusinessQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    AuthService::from_state(&state)
        .check_business_code(&q.code)
        .await?;
    Ok(Json(MessageResponse {
        message: "Business code available",
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let res = AuthService::from_state(&state)
        .login(&payload.email, &payload.password)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer_value(&res.tokens.access_token)?);
    headers.insert(REFRESH_AUTHORIZATION, bearer_value(&res.tokens.refresh_token)?);

    Ok((
        headers,
        Json(LoginResponse {
            user_id: res.user_id,
            user_type: res.user_type,
        }),
    ))
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let Some(token) = bearer_token(&headers, &REFRESH_AUTHORIZATION) else {
        warn!("missing refresh-authorization header");
        return Err(ApiError::Unauthenticated);
    };
    let res = AuthService::from_state(&state).refresh(token).await?;

    let mut out = HeaderMap::new();
    out.insert(AUTHORIZATION, bearer_value(&res.access_token)?);
    Ok((
        out,
        Json(LoginResponse {
            user_id: res.user_id,
            user_type: res.user_type,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = AuthService::from_state(&state).personal_users().await?;
    info!(requested_by = identity.user_id, count = users.len(), "listed personal users");
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
) -> Result<Json<PublicUser>, ApiError> {
    let user = AuthService::from_state(&state)
        .find_user(identity.user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_enter_user(
    State(state): State<AppState>,
    identity: PropagatedIdentity,
) -> Result<Json<EnterpriseUser>, ApiError> {
    if identity.user_type != UserType::Enterprise {
        return Err(ApiError::Forbidden("Enterprise account required"));
    }
    let user = AuthService::from_state(&state)
        .find_user(identity.user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    let business_code = user.business_code.clone();
    Ok(Json(EnterpriseUser {
        user: user.into(),
        business_code,
    }))
}
