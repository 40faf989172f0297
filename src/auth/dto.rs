use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{claims::UserType, repo_types::User};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub user_type: UserType,
    #[serde(default)]
    pub business_code: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct BusinessQuery {
    pub code: String,
}

/// Body returned after login or refresh; tokens travel in headers.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub user_type: UserType,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            user_type: u.user_type,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnterpriseUser {
    #[serde(flatten)]
    pub user: PublicUser,
    pub business_code: Option<String>,
}
