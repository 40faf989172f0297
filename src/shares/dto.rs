use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::ApiError;

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Serialize, FromRow)]
pub struct Share {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ShareComment {
    pub id: i64,
    pub share_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ShareDetail {
    #[serde(flatten)]
    pub share: Share,
    pub comments: Vec<ShareComment>,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl ShareRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("Title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ApiError::BadRequest(format!(
                "Title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct WriteCommentRequest {
    pub share_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ModifyCommentRequest {
    pub content: String,
}

pub fn validate_comment(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment must not be empty".into()));
    }
    Ok(())
}
