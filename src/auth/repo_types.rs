use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::claims::UserType;

/// Raw `users` row; `user_type` is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub user_type: String,
    pub business_code: Option<String>,
    pub created_at: OffsetDateTime,
}

/// User record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub nickname: String,
    pub user_type: UserType,
    pub business_code: Option<String>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            nickname: r.nickname,
            user_type: r.user_type.parse()?,
            business_code: r.business_code,
            created_at: r.created_at,
        })
    }
}

/// Everything needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub user_type: UserType,
    pub business_code: Option<String>,
}
