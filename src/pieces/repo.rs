use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use super::dto::{CreatePieceRequest, Piece, PieceSearch};

const PIECE_COLUMNS: &str =
    "id, owner_id, name, description, piece_type, file_url, created_at, updated_at";

#[derive(Debug, FromRow)]
pub struct PieceRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub piece_type: String,
    pub file_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<PieceRow> for Piece {
    type Error = anyhow::Error;

    fn try_from(r: PieceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            description: r.description,
            piece_type: r.piece_type.parse()?,
            file_url: r.file_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Escapes `%`, `_` and `\` so the keyword matches literally inside ILIKE.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn insert(db: &PgPool, owner_id: i64, req: &CreatePieceRequest) -> anyhow::Result<Piece> {
    let row = sqlx::query_as::<_, PieceRow>(&format!(
        r#"
        INSERT INTO pieces (owner_id, name, description, piece_type, file_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PIECE_COLUMNS}
        "#
    ))
    .bind(owner_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.piece_type.as_str())
    .bind(&req.file_url)
    .fetch_one(db)
    .await?;
    Piece::try_from(row)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Piece>> {
    let row = sqlx::query_as::<_, PieceRow>(&format!(
        "SELECT {PIECE_COLUMNS} FROM pieces WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    row.map(Piece::try_from).transpose()
}

pub fn search_query(owner_id: i64, search: &PieceSearch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {PIECE_COLUMNS} FROM pieces WHERE owner_id = "
    ));
    qb.push_bind(owner_id);
    if !search.key_word.is_empty() {
        qb.push(format!(" AND {} ILIKE ", search.field.column()));
        qb.push_bind(format!("%{}%", escape_like(&search.key_word)));
    }
    if let Some(piece_type) = search.piece_type {
        qb.push(" AND piece_type = ");
        qb.push_bind(piece_type.as_str());
    }
    qb.push(" ORDER BY ");
    qb.push(search.sort.order_clause());
    qb
}

pub async fn search(db: &PgPool, owner_id: i64, search: &PieceSearch) -> anyhow::Result<Vec<Piece>> {
    let rows = search_query(owner_id, search)
        .build_query_as::<PieceRow>()
        .fetch_all(db)
        .await?;
    rows.into_iter().map(Piece::try_from).collect()
}

pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM pieces WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::Execute;

    use super::*;
    use crate::pieces::dto::{PieceType, SearchField, SortBy};

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn search_sql_uses_whitelisted_columns_and_binds() {
        let search = PieceSearch {
            field: SearchField::Description,
            key_word: "moon".into(),
            piece_type: Some(PieceType::Art),
            sort: SortBy::Name,
        };
        let mut qb = search_query(3, &search);
        let sql = qb.build().sql().to_string();
        assert_eq!(
            sql,
            format!(
                "SELECT {PIECE_COLUMNS} FROM pieces WHERE owner_id = $1 \
                 AND description ILIKE $2 AND piece_type = $3 ORDER BY name ASC, id ASC"
            )
        );
    }

    #[test]
    fn empty_keyword_skips_filter() {
        let search = PieceSearch {
            field: SearchField::Name,
            key_word: String::new(),
            piece_type: None,
            sort: SortBy::UpdatedAt,
        };
        let mut qb = search_query(3, &search);
        assert!(!qb.build().sql().contains("ILIKE"));
    }
}
