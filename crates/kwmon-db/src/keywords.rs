//! Database operations for the `keywords` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `keywords` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRow {
    pub id: i64,
    pub user_id: Uuid,
    pub keyword: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Active keywords for `user_id` in registration order.
///
/// This order is the collection order and therefore the record order of the
/// user's monitoring document.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_keywords(pool: &PgPool, user_id: Uuid) -> Result<Vec<KeywordRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordRow>(
        "SELECT id, user_id, keyword, is_active, created_at \
         FROM keywords \
         WHERE user_id = $1 AND is_active = true \
         ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Registers a new active keyword for `user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when `keyword`
/// is blank.
pub async fn add_keyword(pool: &PgPool, user_id: Uuid, keyword: &str) -> Result<KeywordRow, DbError> {
    let row = sqlx::query_as::<_, KeywordRow>(
        "INSERT INTO keywords (user_id, keyword) \
         VALUES ($1, $2) \
         RETURNING id, user_id, keyword, is_active, created_at",
    )
    .bind(user_id)
    .bind(keyword)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Stops collecting a keyword without deleting it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the keyword does not belong to `user_id`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_keyword(pool: &PgPool, user_id: Uuid, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE keywords SET is_active = false \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
