use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::FavoriteChannelRow;

pub async fn list_active(pool: &PgPool) -> Result<Vec<FavoriteChannelRow>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteChannelRow>(
        r#"
        SELECT id, owner_id, channel_id, title, thumbnail,
               created_at, last_seen_at, deleted_at
        FROM favorite_channels
        WHERE deleted_at IS NULL
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Re-adding a tombstoned favorite revives the existing row.
pub async fn upsert(
    pool: &PgPool,
    id: &str,
    owner_id: &str,
    channel_id: &str,
    title: &str,
    thumbnail: Option<&str>,
) -> Result<FavoriteChannelRow, sqlx::Error> {
    sqlx::query_as::<_, FavoriteChannelRow>(
        r#"
        INSERT INTO favorite_channels (id, owner_id, channel_id, title, thumbnail)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (owner_id, channel_id) DO UPDATE SET
            title = EXCLUDED.title,
            thumbnail = EXCLUDED.thumbnail,
            deleted_at = NULL
        RETURNING id, owner_id, channel_id, title, thumbnail,
                  created_at, last_seen_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(channel_id)
    .bind(title)
    .bind(thumbnail)
    .fetch_one(pool)
    .await
}

pub async fn tombstone(pool: &PgPool, owner_id: &str, channel_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE favorite_channels
        SET deleted_at = now()
        WHERE owner_id = $1 AND channel_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(owner_id)
    .bind(channel_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_seen(
    pool: &PgPool,
    owner_id: &str,
    seen_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE favorite_channels
        SET last_seen_at = $2
        WHERE owner_id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(owner_id)
    .bind(seen_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
