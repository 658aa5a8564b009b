use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Two-state decision record; a pending request either gets approved or
/// rejected, and decided requests are never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizerRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub request_type: String,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Pending request joined with its requester, as the admin oversight tab
/// lists them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingOrganizer {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(rename = "eventId")]
    pub event_id: Option<Uuid>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}
