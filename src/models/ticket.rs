use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ordinal: i32,
    pub code: String,
    pub assigned_to: Option<Uuid>,
    pub scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
}

/// Codes are minted once, at event creation, one per capacity slot.
/// Titles are unique, so the code is globally unique as well.
pub fn ticket_code(title: &str, ordinal: i32, capacity: i32) -> String {
    format!("{} - {}/{}", title, ordinal, capacity)
}

/// One row of an event's attendee CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct AttendeeRow {
    pub username: String,
    pub email: String,
    pub code: String,
    pub scanned: bool,
}
