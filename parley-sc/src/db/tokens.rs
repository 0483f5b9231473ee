//! Access token (QR group) queries

use chrono::{DateTime, Utc};
use parley_common::db::AccessToken;
use parley_common::Result;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, venue_id, token_data, group_id, max_capacity, current_usage, \
                       expires_at, is_active, created_at";

pub async fn find_by_data(
    conn: &mut SqliteConnection,
    token_data: &str,
) -> Result<Option<AccessToken>> {
    let token = sqlx::query_as::<_, AccessToken>(&format!(
        "SELECT {} FROM access_tokens WHERE token_data = ?",
        COLUMNS
    ))
    .bind(token_data)
    .fetch_optional(conn)
    .await?;

    Ok(token)
}

pub async fn find(conn: &mut SqliteConnection, token_id: &str) -> Result<Option<AccessToken>> {
    let token = sqlx::query_as::<_, AccessToken>(&format!(
        "SELECT {} FROM access_tokens WHERE id = ?",
        COLUMNS
    ))
    .bind(token_id)
    .fetch_optional(conn)
    .await?;

    Ok(token)
}

/// Consume one admission slot.
///
/// The capacity check and the increment are a single conditional UPDATE so
/// two concurrent consumers can never both take the last slot; the caller
/// must check the returned flag, never pre-read the counter.
pub async fn try_consume(
    conn: &mut SqliteConnection,
    token_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE access_tokens
        SET current_usage = current_usage + 1
        WHERE id = ?
          AND is_active = 1
          AND expires_at > ?
          AND current_usage < max_capacity
        "#,
    )
    .bind(token_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Newest active, unexpired token for a venue that still has slots
pub async fn active_for_venue(
    conn: &mut SqliteConnection,
    venue_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<AccessToken>> {
    let token = sqlx::query_as::<_, AccessToken>(&format!(
        r#"
        SELECT {}
        FROM access_tokens
        WHERE venue_id = ?
          AND is_active = 1
          AND expires_at > ?
          AND current_usage < max_capacity
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        COLUMNS
    ))
    .bind(venue_id)
    .bind(now)
    .fetch_optional(conn)
    .await?;

    Ok(token)
}

pub async fn deactivate_for_venue(conn: &mut SqliteConnection, venue_id: &str) -> Result<u64> {
    let result =
        sqlx::query("UPDATE access_tokens SET is_active = 0 WHERE venue_id = ? AND is_active = 1")
            .bind(venue_id)
            .execute(conn)
            .await?;

    Ok(result.rows_affected())
}

/// Deactivate every token past its expiry. Idempotent maintenance.
pub async fn deactivate_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<u64> {
    let result =
        sqlx::query("UPDATE access_tokens SET is_active = 0 WHERE expires_at < ? AND is_active = 1")
            .bind(now)
            .execute(conn)
            .await?;

    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, token: &AccessToken) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO access_tokens
            (id, venue_id, token_data, group_id, max_capacity, current_usage,
             expires_at, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&token.id)
    .bind(&token.venue_id)
    .bind(&token.token_data)
    .bind(&token.group_id)
    .bind(token.max_capacity)
    .bind(token.current_usage)
    .bind(token.expires_at)
    .bind(token.is_active)
    .bind(token.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
