//! Venue booking arbitration
//!
//! Enforces the per-student single-active-booking rule and the venue
//! occupancy bound ahead of admission. The occupancy check rides inside the
//! participant insert itself so concurrent bookings cannot oversubscribe a
//! venue.

use chrono::{Duration, Utc};
use parley_common::config::ServiceConfig;
use parley_common::db::{Session, SessionStatus};
use parley_common::events::{EventBus, SessionEvent};
use parley_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::{BookingView, VenueAvailability};

pub struct BookingOutcome {
    pub session_id: String,
    pub booked_seats: i64,
    pub remaining_seats: i64,
}

/// Reserve a seat at a venue, reusing or creating its pending session
pub async fn book_venue(
    pool: &SqlitePool,
    bus: &EventBus,
    config: &ServiceConfig,
    student_id: &str,
    venue_id: &str,
) -> Result<BookingOutcome> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let venue = db::venues::find(&mut tx, venue_id)
        .await?
        .filter(|v| v.is_active)
        .ok_or_else(|| Error::NotFound("Venue not found".to_string()))?;

    let student = db::students::find(&mut tx, student_id)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    if student.level != venue.level {
        return Err(Error::Forbidden(format!(
            "You can only book venues for your current level (Level {})",
            student.level
        )));
    }

    // One active booking per student per level
    let active = db::participants::active_booking_count(&mut tx, student_id, venue.level, now).await?;
    if active > 0 {
        return Err(Error::Conflict(format!(
            "You already have an active booking for Level {}. Complete or cancel it before booking another venue at this level",
            venue.level
        )));
    }

    let (session, created) = match db::sessions::open_for_venue(&mut tx, &venue.id, now).await? {
        Some(session) => (session, false),
        None => {
            let session = Session {
                id: Uuid::new_v4().to_string(),
                venue_id: venue.id.clone(),
                group_id: None,
                status: SessionStatus::Pending.as_str().to_string(),
                start_time: now,
                end_time: now + Duration::minutes(config.booking_session_minutes),
                topic: None,
                level: venue.level,
                created_at: now,
            };
            db::sessions::insert(&mut tx, &session).await?;
            (session, true)
        }
    };

    // Occupancy bound and insert are one conditional statement
    let inserted = db::participants::insert_if_venue_capacity(
        &mut tx,
        &Uuid::new_v4().to_string(),
        &session.id,
        student_id,
        &venue.id,
        now,
    )
    .await?;
    if inserted == 0 {
        return Err(Error::Conflict("Venue is full".to_string()));
    }

    db::students::set_booking(&mut tx, student_id, &session.id).await?;

    let booked = db::venues::occupancy(&mut tx, &venue.id, now).await?;

    tx.commit().await?;

    info!(
        session_id = %session.id,
        venue_id = %venue.id,
        student_id = %student_id,
        "Venue booked"
    );

    if created {
        bus.emit(SessionEvent::SessionCreated {
            session_id: parse_uuid(&session.id),
            venue_id: parse_uuid(&venue.id),
            timestamp: now,
        });
    }

    Ok(BookingOutcome {
        session_id: session.id,
        booked_seats: booked,
        remaining_seats: venue.capacity - booked,
    })
}

/// Withdraw a booking that has not started.
///
/// Once the session has gone active the participant cannot silently vanish;
/// cancellation then fails with a conflict.
pub async fn cancel_booking(pool: &SqlitePool, student_id: &str, venue_id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let removed = db::participants::delete_unstarted(&mut tx, student_id, venue_id).await?;
    if removed == 0 {
        if db::participants::has_active_participation(&mut tx, student_id, venue_id).await? {
            return Err(Error::Conflict(
                "Session already started; a booking cannot be withdrawn after admission".to_string(),
            ));
        }
        return Err(Error::NotFound("No active booking found".to_string()));
    }

    db::students::clear_booking_for_venue(&mut tx, student_id, venue_id).await?;

    tx.commit().await?;

    info!(student_id = %student_id, venue_id = %venue_id, "Booking cancelled");
    Ok(())
}

/// Whether the student currently holds a booking at the venue
pub async fn check_booking(pool: &SqlitePool, student_id: &str, venue_id: &str) -> Result<bool> {
    let mut conn = pool.acquire().await?;
    db::participants::is_booked_at_venue(&mut conn, student_id, venue_id).await
}

/// The student's open bookings with venue names
pub async fn list_bookings(pool: &SqlitePool, student_id: &str) -> Result<Vec<BookingView>> {
    let mut conn = pool.acquire().await?;
    let rows = db::participants::bookings_view(&mut conn, student_id).await?;

    Ok(rows
        .into_iter()
        .map(|(session_id, venue_name, status, start_time, end_time)| BookingView {
            session_id,
            venue_name,
            status,
            start_time,
            end_time,
        })
        .collect())
}

/// Venues at a level with live occupancy figures
pub async fn list_available_venues(
    pool: &SqlitePool,
    level: i64,
) -> Result<Vec<VenueAvailability>> {
    let now = Utc::now();
    let mut conn = pool.acquire().await?;

    let venues = db::venues::list_active_by_level(&mut conn, level).await?;
    let mut out = Vec::with_capacity(venues.len());

    for venue in venues {
        let booked = db::venues::occupancy(&mut conn, &venue.id, now).await?;
        let latest = db::sessions::latest_open_for_venue(&mut conn, &venue.id).await?;
        let has_active_session = latest.as_ref().map(|s| s.end_time > now).unwrap_or(false);

        out.push(VenueAvailability {
            id: venue.id,
            venue_name: venue.name,
            capacity: venue.capacity,
            booked,
            remaining: venue.capacity - booked,
            level: venue.level,
            has_active_session,
            end_time: latest.map(|s| s.end_time),
        });
    }

    Ok(out)
}

fn parse_uuid(id: &str) -> Uuid {
    Uuid::parse_str(id).unwrap_or(Uuid::nil())
}
