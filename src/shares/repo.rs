use sqlx::PgPool;

use super::dto::{Share, ShareComment, ShareRequest};

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Share>> {
    let rows = sqlx::query_as::<_, Share>(
        r#"
        SELECT id, author_id, title, content, created_at, updated_at
        FROM shares
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Share>> {
    let row = sqlx::query_as::<_, Share>(
        r#"
        SELECT id, author_id, title, content, created_at, updated_at
        FROM shares
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, author_id: i64, req: &ShareRequest) -> anyhow::Result<Share> {
    let row = sqlx::query_as::<_, Share>(
        r#"
        INSERT INTO shares (author_id, title, content)
        VALUES ($1, $2, $3)
        RETURNING id, author_id, title, content, created_at, updated_at
        "#,
    )
    .bind(author_id)
    .bind(req.title.trim())
    .bind(&req.content)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: i64, req: &ShareRequest) -> anyhow::Result<Share> {
    let row = sqlx::query_as::<_, Share>(
        r#"
        UPDATE shares
        SET title = $2, content = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, author_id, title, content, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.title.trim())
    .bind(&req.content)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Comments go with the share through the foreign key cascade.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM shares WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn comments_for(db: &PgPool, share_id: i64) -> anyhow::Result<Vec<ShareComment>> {
    let rows = sqlx::query_as::<_, ShareComment>(
        r#"
        SELECT id, share_id, author_id, content, created_at, updated_at
        FROM share_comments
        WHERE share_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(share_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_comment(db: &PgPool, id: i64) -> anyhow::Result<Option<ShareComment>> {
    let row = sqlx::query_as::<_, ShareComment>(
        r#"
        SELECT id, share_id, author_id, content, created_at, updated_at
        FROM share_comments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert_comment(
    db: &PgPool,
    share_id: i64,
    author_id: i64,
    content: &str,
) -> anyhow::Result<ShareComment> {
    let row = sqlx::query_as::<_, ShareComment>(
        r#"
        INSERT INTO share_comments (share_id, author_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, share_id, author_id, content, created_at, updated_at
        "#,
    )
    .bind(share_id)
    .bind(author_id)
    .bind(content.trim())
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_comment(db: &PgPool, id: i64, content: &str) -> anyhow::Result<ShareComment> {
    let row = sqlx::query_as::<_, ShareComment>(
        r#"
        UPDATE share_comments
        SET content = $2, updated_at = now()
        WHERE id = $1
        RETURNING id, share_id, author_id, content, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(content.trim())
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete_comment(db: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM share_comments WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
