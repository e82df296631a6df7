//! Database operations for the `monitoring_documents` table.
//!
//! One JSONB document per user. Writes always replace the whole document.

use kwmon_core::MonitoringDocument;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Load the stored document for `user_id`, or `None` if the user has none yet.
///
/// # Errors
///
/// Returns [`DbError::MalformedDocument`] if the stored JSON does not decode,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn load_document(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<MonitoringDocument>, DbError> {
    let raw = sqlx::query_scalar::<_, serde_json::Value>(
        "SELECT document FROM monitoring_documents WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    raw.map(|value| {
        serde_json::from_value(value)
            .map_err(|source| DbError::MalformedDocument { user_id, source })
    })
    .transpose()
}

/// Atomically replace the document for `user_id` with `document`.
///
/// A single upsert statement, so readers see either the old or the new
/// document and never a mix.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn replace_document(
    pool: &PgPool,
    user_id: Uuid,
    document: &MonitoringDocument,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO monitoring_documents (user_id, document, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (user_id) DO UPDATE \
         SET document = EXCLUDED.document, updated_at = NOW()",
    )
    .bind(user_id)
    .bind(Json(document))
    .execute(pool)
    .await?;

    Ok(())
}

/// Every user that has a stored document, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_document_owners(pool: &PgPool) -> Result<Vec<Uuid>, DbError> {
    let owners = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM monitoring_documents ORDER BY user_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(owners)
}
