//! Keyword registration commands.

use sqlx::PgPool;
use uuid::Uuid;

pub(crate) async fn list(pool: &PgPool, user: Uuid) -> anyhow::Result<()> {
    let rows = kwmon_db::list_active_keywords(pool, user).await?;
    if rows.is_empty() {
        println!("no active keywords for {user}");
    }
    for row in rows {
        println!("{:>6}  {}", row.id, row.keyword);
    }
    Ok(())
}

pub(crate) async fn add(pool: &PgPool, user: Uuid, keyword: &str) -> anyhow::Result<()> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        anyhow::bail!("keyword must not be blank");
    }
    let row = kwmon_db::add_keyword(pool, user, keyword).await?;
    println!("added keyword {} ({})", row.keyword, row.id);
    Ok(())
}

pub(crate) async fn remove(pool: &PgPool, user: Uuid, id: i64) -> anyhow::Result<()> {
    match kwmon_db::deactivate_keyword(pool, user, id).await {
        Ok(()) => {
            println!("deactivated keyword {id}");
            Ok(())
        }
        Err(kwmon_db::DbError::NotFound) => anyhow::bail!("keyword {id} not found for {user}"),
        Err(e) => Err(e.into()),
    }
}
