//! Access-token issuance and lookup
//!
//! The token-generation collaborator: produces a payload embedding
//! `{venue_id, expiry}` plus a random discriminator, stored as the opaque
//! string students scan. Issuing a fresh token retires the venue's previous
//! ones so one group is admitting at a time.

use chrono::{Duration, Utc};
use parley_common::db::AccessToken;
use parley_common::{Error, Result};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::TokenPayload;

/// Newest usable token for a venue, if one is live
pub async fn active_token(pool: &SqlitePool, venue_id: &str) -> Result<Option<AccessToken>> {
    let mut conn = pool.acquire().await?;
    db::tokens::active_for_venue(&mut conn, venue_id, Utc::now()).await
}

/// Issue a fresh capacity-bounded token for a venue
pub async fn issue_token(
    pool: &SqlitePool,
    venue_id: &str,
    max_capacity: i64,
    validity_minutes: i64,
) -> Result<AccessToken> {
    if max_capacity < 1 {
        return Err(Error::InvalidInput(
            "Token capacity must be at least 1".to_string(),
        ));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let venue = db::venues::find(&mut tx, venue_id)
        .await?
        .filter(|v| v.is_active)
        .ok_or_else(|| Error::NotFound("Venue not found".to_string()))?;

    db::tokens::deactivate_for_venue(&mut tx, &venue.id).await?;

    let expires_at = now + Duration::minutes(validity_minutes);
    let payload = TokenPayload {
        venue_id: venue.id.clone(),
        expiry: expires_at,
        nonce: random_nonce(),
    };
    let token_data = serde_json::to_string(&payload)
        .map_err(|e| Error::Internal(format!("Failed to encode token payload: {}", e)))?;

    let token = AccessToken {
        id: Uuid::new_v4().to_string(),
        venue_id: venue.id.clone(),
        token_data,
        group_id: Uuid::new_v4().to_string(),
        max_capacity,
        current_usage: 0,
        expires_at,
        is_active: true,
        created_at: now,
    };
    db::tokens::insert(&mut tx, &token).await?;

    tx.commit().await?;

    info!(
        token_id = %token.id,
        venue_id = %venue.id,
        max_capacity,
        "Access token issued"
    );

    Ok(token)
}

fn random_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
