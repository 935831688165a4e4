//! Conversation session repository for `SQLite` persistence.
//!
//! Sessions are keyed by phone number and overwritten on every turn.
//! There is no version check: concurrent turns for the same phone race
//! and the last `save` wins.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::models::session::{ConversationState, Session, SessionContext};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for conversation sessions.
#[derive(Clone)]
pub struct SessionRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SessionRow {
    phone_number: String,
    current_state: String,
    context_json: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        let current_state: ConversationState = self.current_state.parse()?;
        let context: SessionContext = serde_json::from_str(&self.context_json)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Db(format!("invalid created_at: {e}")))?
            .with_timezone(&Utc);
        let updated_at = chrono::DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| AppError::Db(format!("invalid updated_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Session {
            phone_number: self.phone_number,
            current_state,
            context,
            created_at,
            updated_at,
        })
    }
}

impl SessionRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Return the session for `phone`, creating a WELCOME session with an
    /// empty cart on first contact.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert or read fails, or the stored
    /// context cannot be decoded.
    pub async fn get_or_create(&self, phone: &str) -> Result<Session> {
        let fresh = Session::new(phone.to_owned());
        let context_json = serde_json::to_string(&fresh.context)?;
        let now = fresh.created_at.to_rfc3339();

        sqlx::query(
            "INSERT INTO conversation_session
                 (phone_number, current_state, context_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(phone_number) DO NOTHING",
        )
        .bind(phone)
        .bind(fresh.current_state.as_str())
        .bind(&context_json)
        .bind(&now)
        .execute(self.db.as_ref())
        .await?;

        self.get(phone)
            .await?
            .ok_or_else(|| AppError::Db("failed to create session".into()))
    }

    /// Fetch the session for `phone`, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or the row is corrupt.
    pub async fn get(&self, phone: &str) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT phone_number, current_state, context_json, created_at, updated_at
             FROM conversation_session WHERE phone_number = ?1",
        )
        .bind(phone)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// Overwrite the state and context for `phone` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn save(
        &self,
        phone: &str,
        state: ConversationState,
        context: &SessionContext,
    ) -> Result<()> {
        let context_json = serde_json::to_string(context)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO conversation_session
                 (phone_number, current_state, context_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(phone_number) DO UPDATE SET
                 current_state = excluded.current_state,
                 context_json = excluded.context_json,
                 updated_at = excluded.updated_at",
        )
        .bind(phone)
        .bind(state.as_str())
        .bind(&context_json)
        .bind(&now)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }
}

/// Put an existing session back to WELCOME with an empty context, on a
/// connection the caller holds (usually an open transaction).
///
/// A phone without a session row is left alone.
///
/// # Errors
///
/// Returns `AppError::Db` if the update fails.
pub async fn reset_on(conn: &mut SqliteConnection, phone: &str) -> Result<()> {
    let context_json = serde_json::to_string(&SessionContext::default())?;

    sqlx::query(
        "UPDATE conversation_session
         SET current_state = ?2, context_json = ?3, updated_at = ?4
         WHERE phone_number = ?1",
    )
    .bind(phone)
    .bind(ConversationState::Welcome.as_str())
    .bind(&context_json)
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await?;

    Ok(())
}
