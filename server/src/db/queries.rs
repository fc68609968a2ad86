//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.
//! Functions taking a `PgConnection` are meant to run inside a transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::error;
use uuid::Uuid;

use super::models::{NewUser, PollOptionRow, PollRow, Session, User, VoteRow};

/// Advisory lock seed serializing registrations (first-user admin grant).
pub const LOCK_SEED_REGISTRATION: i32 = 41;
/// Advisory lock seed serializing votes of one voter on one poll.
pub const LOCK_SEED_VOTE: i32 = 61;

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

const POLL_COLUMNS: &str = "id, user_id, title, description, created_at, updated_at";
const OPTION_COLUMNS: &str = "id, poll_id, option_text, position";
const VOTE_COLUMNS: &str = "id, poll_id, option_id, user_id, created_at";

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by (normalized) email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_user_by_email", email = %email))
}

/// Count all users.
pub async fn count_users(conn: &mut PgConnection) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(conn)
        .await
        .map_err(db_error!("count_users", table = "users"))
}

/// Insert a user.
pub async fn insert_user(conn: &mut PgConnection, new_user: &NewUser) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, password_hash, created_at
        ",
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .fetch_one(conn)
    .await
}

/// Grant system admin to a user.
pub async fn insert_system_admin(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO system_admins (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(conn)
        .await
        .map_err(db_error!("insert_system_admin", user_id = %user_id))?;
    Ok(())
}

/// Check whether a user is a system admin.
pub async fn is_system_admin(pool: &PgPool, user_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM system_admins WHERE user_id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(db_error!("is_system_admin", user_id = %user_id))
}

/// Take a transaction-scoped advisory lock.
pub async fn advisory_xact_lock(conn: &mut PgConnection, seed: i32, key: &str) -> sqlx::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
        .bind(seed)
        .bind(key)
        .execute(conn)
        .await
        .map_err(db_error!("advisory_xact_lock", seed = seed))?;
    Ok(())
}

// ============================================================================
// Session Queries
// ============================================================================

/// Create a session.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> sqlx::Result<Session> {
    sqlx::query_as::<_, Session>(
        r"
        INSERT INTO sessions (user_id, expires_at)
        VALUES ($1, $2)
        RETURNING id, user_id, created_at, expires_at
        ",
    )
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_session", user_id = %user_id))
}

/// Find a session that has not expired.
pub async fn find_session(pool: &PgPool, session_id: Uuid) -> sqlx::Result<Option<Session>> {
    sqlx::query_as::<_, Session>(
        r"
        SELECT id, user_id, created_at, expires_at
        FROM sessions
        WHERE id = $1 AND expires_at > NOW()
        ",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_session", session_id = %session_id))
}

/// Delete a session.
pub async fn delete_session(pool: &PgPool, session_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_session", session_id = %session_id))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Poll Queries
// ============================================================================

/// Insert a poll row.
pub async fn insert_poll(
    conn: &mut PgConnection,
    owner_id: Uuid,
    title: &str,
    description: Option<&str>,
) -> sqlx::Result<PollRow> {
    sqlx::query_as::<_, PollRow>(&format!(
        "INSERT INTO polls (user_id, title, description) VALUES ($1, $2, $3) RETURNING {POLL_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .fetch_one(conn)
    .await
    .map_err(db_error!("insert_poll", owner_id = %owner_id))
}

/// Insert options for a poll; positions follow slice order.
pub async fn insert_options(
    conn: &mut PgConnection,
    poll_id: Uuid,
    options: &[String],
) -> sqlx::Result<Vec<PollOptionRow>> {
    let positions: Vec<i32> = (0..options.len() as i32).collect();

    sqlx::query_as::<_, PollOptionRow>(&format!(
        r"
        INSERT INTO poll_options (poll_id, option_text, position)
        SELECT $1, t.option_text, t.position
        FROM UNNEST($2::text[], $3::int4[]) AS t(option_text, position)
        RETURNING {OPTION_COLUMNS}
        "
    ))
    .bind(poll_id)
    .bind(options)
    .bind(&positions)
    .fetch_all(conn)
    .await
    .map_err(db_error!("insert_options", poll_id = %poll_id))
}

/// Delete all options of a poll.
pub async fn delete_options(conn: &mut PgConnection, poll_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
        .bind(poll_id)
        .execute(conn)
        .await
        .map_err(db_error!("delete_options", poll_id = %poll_id))?;
    Ok(result.rows_affected())
}

/// Lock a poll row and return its owner.
pub async fn lock_poll_owner(conn: &mut PgConnection, poll_id: Uuid) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar("SELECT user_id FROM polls WHERE id = $1 FOR UPDATE")
        .bind(poll_id)
        .fetch_optional(conn)
        .await
        .map_err(db_error!("lock_poll_owner", poll_id = %poll_id))
}

/// Update title and description of a poll, scoped to its owner.
pub async fn update_poll_row(
    conn: &mut PgConnection,
    poll_id: Uuid,
    owner_id: Uuid,
    title: &str,
    description: Option<&str>,
) -> sqlx::Result<Option<PollRow>> {
    sqlx::query_as::<_, PollRow>(&format!(
        r"
        UPDATE polls
        SET title = $1, description = $2, updated_at = NOW()
        WHERE id = $3 AND user_id = $4
        RETURNING {POLL_COLUMNS}
        "
    ))
    .bind(title)
    .bind(description)
    .bind(poll_id)
    .bind(owner_id)
    .fetch_optional(conn)
    .await
    .map_err(db_error!("update_poll_row", poll_id = %poll_id))
}

/// Delete a poll, optionally scoped to its owner. Returns affected rows.
pub async fn delete_poll(pool: &PgPool, poll_id: Uuid, owner_id: Option<Uuid>) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM polls WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)")
        .bind(poll_id)
        .bind(owner_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_poll", poll_id = %poll_id))?;
    Ok(result.rows_affected())
}

/// Check whether a poll exists.
pub async fn poll_exists(pool: &PgPool, poll_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM polls WHERE id = $1)")
        .bind(poll_id)
        .fetch_one(pool)
        .await
        .map_err(db_error!("poll_exists", poll_id = %poll_id))
}

/// Find a poll row by ID.
pub async fn find_poll(pool: &PgPool, poll_id: Uuid) -> sqlx::Result<Option<PollRow>> {
    sqlx::query_as::<_, PollRow>(&format!("SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"))
        .bind(poll_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_poll", poll_id = %poll_id))
}

/// List poll rows newest first, optionally for one owner.
pub async fn list_polls(pool: &PgPool, owner_id: Option<Uuid>) -> sqlx::Result<Vec<PollRow>> {
    sqlx::query_as::<_, PollRow>(&format!(
        r"
        SELECT {POLL_COLUMNS}
        FROM polls
        WHERE $1::uuid IS NULL OR user_id = $1
        ORDER BY created_at DESC
        "
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_polls", owner_id = ?owner_id))
}

/// Options of several polls (bulk lookup to avoid N+1 queries).
pub async fn list_options(pool: &PgPool, poll_ids: &[Uuid]) -> sqlx::Result<Vec<PollOptionRow>> {
    if poll_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, PollOptionRow>(&format!(
        "SELECT {OPTION_COLUMNS} FROM poll_options WHERE poll_id = ANY($1) ORDER BY poll_id, position"
    ))
    .bind(poll_ids)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_options", polls = poll_ids.len()))
}

// ============================================================================
// Vote Queries
// ============================================================================

/// Votes of several polls.
pub async fn list_votes(pool: &PgPool, poll_ids: &[Uuid]) -> sqlx::Result<Vec<VoteRow>> {
    if poll_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, VoteRow>(&format!(
        "SELECT {VOTE_COLUMNS} FROM votes WHERE poll_id = ANY($1) ORDER BY created_at"
    ))
    .bind(poll_ids)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_votes", polls = poll_ids.len()))
}

/// Check whether an option belongs to a poll.
pub async fn option_in_poll(
    conn: &mut PgConnection,
    poll_id: Uuid,
    option_id: Uuid,
) -> sqlx::Result<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM poll_options WHERE id = $1 AND poll_id = $2)",
    )
    .bind(option_id)
    .bind(poll_id)
    .fetch_one(conn)
    .await
    .map_err(db_error!("option_in_poll", poll_id = %poll_id, option_id = %option_id))
}

/// Check whether a voter already voted on a poll.
pub async fn has_voted(conn: &mut PgConnection, poll_id: Uuid, voter_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM votes WHERE poll_id = $1 AND user_id = $2)")
        .bind(poll_id)
        .bind(voter_id)
        .fetch_one(conn)
        .await
        .map_err(db_error!("has_voted", poll_id = %poll_id, voter_id = %voter_id))
}

/// Insert a vote row.
pub async fn insert_vote(
    conn: &mut PgConnection,
    poll_id: Uuid,
    option_id: Uuid,
    voter_id: Option<Uuid>,
) -> sqlx::Result<VoteRow> {
    sqlx::query_as::<_, VoteRow>(&format!(
        "INSERT INTO votes (poll_id, option_id, user_id) VALUES ($1, $2, $3) RETURNING {VOTE_COLUMNS}"
    ))
    .bind(poll_id)
    .bind(option_id)
    .bind(voter_id)
    .fetch_one(conn)
    .await
}
