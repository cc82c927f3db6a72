//! Stream event database operations.
//!
//! Rows are keyed by the platform's video id; writes always replace the
//! whole row.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{EventType, LiveState, StreamEventRow};
use streamcal_core::types::StreamEvent;

/// Stay well below the 65535 bind parameter limit (12 binds per row).
const UPSERT_CHUNK: usize = 1000;

/// Insert or fully replace events. Duplicate ids inside `events` keep the last occurrence.
pub async fn upsert_many(pool: &PgPool, events: &[StreamEvent]) -> Result<u64, sqlx::Error> {
    let events = dedup_last_wins(events);
    let mut written = 0;

    for chunk in events.chunks(UPSERT_CHUNK) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO stream_events \
             (video_id, channel_id, title, thumbnail, channel_title, channel_thumbnail, \
              scheduled_start_time, actual_start_time, actual_end_time, \
              live_state, event_type, published_at) ",
        );
        qb.push_values(chunk, |mut row, event| {
            row.push_bind(&event.video_id)
                .push_bind(&event.channel_id)
                .push_bind(&event.title)
                .push_bind(&event.thumbnail)
                .push_bind(&event.channel_title)
                .push_bind(&event.channel_thumbnail)
                .push_bind(event.scheduled_start_time)
                .push_bind(event.actual_start_time)
                .push_bind(event.actual_end_time)
                .push_bind(LiveState::from(event.live_state))
                .push_bind(EventType::from(event.event_type))
                .push_bind(event.published_at);
        });
        qb.push(
            " ON CONFLICT (video_id) DO UPDATE SET \
               channel_id = EXCLUDED.channel_id, \
               title = EXCLUDED.title, \
               thumbnail = EXCLUDED.thumbnail, \
               channel_title = EXCLUDED.channel_title, \
               channel_thumbnail = EXCLUDED.channel_thumbnail, \
               scheduled_start_time = EXCLUDED.scheduled_start_time, \
               actual_start_time = EXCLUDED.actual_start_time, \
               actual_end_time = EXCLUDED.actual_end_time, \
               live_state = EXCLUDED.live_state, \
               event_type = EXCLUDED.event_type, \
               published_at = EXCLUDED.published_at, \
               updated_at = now()",
        );

        written += qb.build().execute(pool).await?.rows_affected();
    }

    Ok(written)
}

/// Postgres rejects an upsert that touches the same key twice in one statement.
fn dedup_last_wins(events: &[StreamEvent]) -> Vec<&StreamEvent> {
    let mut seen = std::collections::HashSet::new();
    let mut kept: Vec<&StreamEvent> = events
        .iter()
        .rev()
        .filter(|e| seen.insert(e.video_id.as_str()))
        .collect();
    kept.reverse();
    kept
}

pub async fn list_by_live_state(
    pool: &PgPool,
    states: &[String],
) -> Result<Vec<StreamEventRow>, sqlx::Error> {
    sqlx::query_as::<_, StreamEventRow>(
        r#"
        SELECT video_id, channel_id, title, thumbnail, channel_title, channel_thumbnail,
               scheduled_start_time, actual_start_time, actual_end_time,
               live_state, event_type, published_at
        FROM stream_events
        WHERE live_state::text = ANY($1)
        ORDER BY video_id
        "#,
    )
    .bind(states)
    .fetch_all(pool)
    .await
}

pub async fn list_for_channels(
    pool: &PgPool,
    channel_ids: &[String],
    window: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<StreamEventRow>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT video_id, channel_id, title, thumbnail, channel_title, channel_thumbnail, \
                scheduled_start_time, actual_start_time, actual_end_time, \
                live_state, event_type, published_at \
         FROM stream_events WHERE channel_id = ANY(",
    );
    qb.push_bind(channel_ids).push(")");

    if let Some((start, end)) = window {
        qb.push(" AND (scheduled_start_time AT TIME ZONE 'UTC')::date >= ")
            .push_bind(start)
            .push(" AND (scheduled_start_time AT TIME ZONE 'UTC')::date <= ")
            .push_bind(end);
    }
    qb.push(" ORDER BY scheduled_start_time ASC NULLS LAST, video_id");

    qb.build_query_as::<StreamEventRow>().fetch_all(pool).await
}

/// Strictly-before comparison: an event scheduled exactly at `cutoff` survives.
pub async fn delete_completed_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM stream_events
        WHERE event_type = 'completed' AND scheduled_start_time < $1
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn distinct_channel_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT channel_id
        FROM stream_events
        ORDER BY channel_id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_by_channel(pool: &PgPool, channel_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM stream_events
        WHERE channel_id = $1
        "#,
    )
    .bind(channel_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
