use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceType {
    Art,
    Picture,
}

impl PieceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceType::Art => "ART",
            PieceType::Picture => "PICTURE",
        }
    }
}

impl FromStr for PieceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ART" => Ok(PieceType::Art),
            "PICTURE" => Ok(PieceType::Picture),
            other => anyhow::bail!("unknown piece type: {other}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Piece {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub piece_type: PieceType,
    pub file_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreatePieceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub piece_type: PieceType,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl CreatePieceRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Piece name is required".into()));
        }
        Ok(())
    }
}

/// Raw query string of `/search`; everything is optional.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default)]
    pub key_word: String,
    #[serde(rename = "type", default = "default_type")]
    pub piece_type: String,
    #[serde(default = "default_sort")]
    pub sort: String,
}

fn default_condition() -> String {
    "name".into()
}

fn default_type() -> String {
    "NONE".into()
}

fn default_sort() -> String {
    "updated_at".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Description,
}

impl SearchField {
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    UpdatedAt,
    CreatedAt,
    Name,
}

impl SortBy {
    pub fn order_clause(&self) -> &'static str {
        match self {
            SortBy::UpdatedAt => "updated_at DESC, id DESC",
            SortBy::CreatedAt => "created_at DESC, id DESC",
            SortBy::Name => "name ASC, id ASC",
        }
    }
}

/// Validated search; only whitelisted columns ever reach SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceSearch {
    pub field: SearchField,
    pub key_word: String,
    pub piece_type: Option<PieceType>,
    pub sort: SortBy,
}

impl TryFrom<SearchParams> for PieceSearch {
    type Error = ApiError;

    fn try_from(p: SearchParams) -> Result<Self, Self::Error> {
        let field = match p.condition.to_ascii_lowercase().as_str() {
            "name" => SearchField::Name,
            "description" => SearchField::Description,
            _ => return Err(ApiError::BadRequest("Unknown search condition".into())),
        };
        let piece_type = match p.piece_type.to_ascii_uppercase().as_str() {
            "NONE" | "" => None,
            other => Some(
                other
                    .parse::<PieceType>()
                    .map_err(|_| ApiError::BadRequest("Unknown piece type".into()))?,
            ),
        };
        let sort = match p.sort.to_ascii_lowercase().as_str() {
            "updated_at" => SortBy::UpdatedAt,
            "created_at" => SortBy::CreatedAt,
            "name" => SortBy::Name,
            _ => return Err(ApiError::BadRequest("Unknown sort".into())),
        };
        Ok(Self {
            field,
            key_word: p.key_word.trim().to_string(),
            piece_type,
            sort,
        })
    }
}
