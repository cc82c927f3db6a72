use chrono::NaiveDate;
use sqlx::PgPool;

/// Any recorded window for the channel touching `[start, end]` counts as coverage,
/// including partial overlaps.
pub async fn overlaps(
    pool: &PgPool,
    channel_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM fetched_date_ranges
            WHERE channel_id = $1 AND end_date >= $2 AND start_date <= $3
        )
        "#,
    )
    .bind(channel_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    channel_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO fetched_date_ranges (channel_id, start_date, end_date)
        VALUES ($1, $2, $3)
        ON CONFLICT (channel_id, start_date, end_date) DO NOTHING
        "#,
    )
    .bind(channel_id)
    .bind(start)
    .bind(end)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn distinct_channel_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT channel_id
        FROM fetched_date_ranges
        ORDER BY channel_id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_started_before(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM fetched_date_ranges
        WHERE start_date < $1
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_channel(pool: &PgPool, channel_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM fetched_date_ranges
        WHERE channel_id = $1
        "#,
    )
    .bind(channel_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
