//! Database initialization
//!
//! Creates the schema on first run; every statement is idempotent so startup
//! is safe against an existing database.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_and_migrate(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests
///
/// A single pooled connection keeps every caller on the same in-memory
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_and_migrate(&pool).await?;
    Ok(pool)
}

async fn configure_and_migrate(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    create_venues_table(pool).await?;
    create_students_table(pool).await?;
    create_access_tokens_table(pool).await?;
    create_sessions_table(pool).await?;
    create_participants_table(pool).await?;
    create_questions_table(pool).await?;
    create_rank_points_table(pool).await?;
    create_score_entries_table(pool).await?;
    create_completions_table(pool).await?;
    create_promotions_table(pool).await?;
    create_ready_marks_table(pool).await?;

    create_indexes(pool).await?;
    init_default_rank_points(pool).await?;

    Ok(())
}

async fn create_venues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            level INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 1,
            current_booking TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_access_tokens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS access_tokens (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL REFERENCES venues(id),
            token_data TEXT NOT NULL UNIQUE,
            group_id TEXT NOT NULL,
            max_capacity INTEGER NOT NULL,
            current_usage INTEGER NOT NULL DEFAULT 0,
            expires_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL REFERENCES venues(id),
            group_id TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'lobby', 'active', 'completed')),
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            topic TEXT,
            level INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_participants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            student_id TEXT NOT NULL,
            is_dummy INTEGER NOT NULL DEFAULT 0,
            UNIQUE (session_id, student_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            level INTEGER NOT NULL,
            prompt TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 1.0,
            display_order INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_rank_points_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rank_points (
            level INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            points REAL NOT NULL,
            PRIMARY KEY (level, rank)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_score_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS score_entries (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            question_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            responder_id TEXT NOT NULL,
            rank INTEGER NOT NULL,
            score REAL NOT NULL,
            weighted_score REAL NOT NULL,
            penalty_points REAL NOT NULL DEFAULT 0,
            deviation REAL,
            median_score REAL NOT NULL DEFAULT 0,
            average_score REAL NOT NULL DEFAULT 0,
            is_biased INTEGER NOT NULL DEFAULT 0,
            is_completed INTEGER NOT NULL DEFAULT 0,
            penalty_calculated INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_completions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS completions (
            session_id TEXT NOT NULL REFERENCES sessions(id),
            student_id TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            PRIMARY KEY (session_id, student_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_promotions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS promotions (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            old_level INTEGER NOT NULL,
            new_level INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            promoted_at TEXT NOT NULL,
            UNIQUE (student_id, session_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ready_marks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ready_marks (
            session_id TEXT NOT NULL REFERENCES sessions(id),
            student_id TEXT NOT NULL,
            is_ready INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (session_id, student_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sessions_venue_status ON sessions (venue_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_participants_student ON participants (student_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_score_entries_session ON score_entries (session_id, question_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_access_tokens_venue ON access_tokens (venue_id, is_active)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the configurable base-points table
///
/// Rank 1 earns the most points; the runtime falls back to `5 - rank` for
/// ranks beyond the seeded range. INSERT OR IGNORE keeps operator overrides.
async fn init_default_rank_points(pool: &SqlitePool) -> Result<()> {
    for level in 1..=5i64 {
        for rank in 1..=4i64 {
            sqlx::query(
                "INSERT OR IGNORE INTO rank_points (level, rank, points) VALUES (?, ?, ?)",
            )
            .bind(level)
            .bind(rank)
            .bind((5 - rank) as f64)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}
