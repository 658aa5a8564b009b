use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    pub event_type: String,
    pub capacity: i32,
    pub remaining_tickets: i32,
    pub scanned_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Share of capacity that has been scanned in, as a percentage with one
    /// decimal. Derived on read; never stored.
    pub fn attendance_rate(&self) -> f64 {
        if self.capacity <= 0 {
            return 0.0;
        }
        let rate = f64::from(self.scanned_count) * 100.0 / f64::from(self.capacity);
        (rate * 10.0).round() / 10.0
    }
}

/// Event as listed by `GET /events`, with derived counters and the
/// organizer usernames attached.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub capacity: i32,
    #[serde(rename = "remainingTickets")]
    pub remaining_tickets: i32,
    #[serde(rename = "scannedTickets")]
    pub scanned_count: i32,
    #[serde(rename = "attendanceRate")]
    pub attendance_rate: f64,
    pub organizers: Vec<String>,
}

impl EventSummary {
    pub fn from_event(event: Event, organizers: Vec<String>) -> Self {
        let attendance_rate = event.attendance_rate();
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.event_date,
            time: event.event_time,
            location: event.location,
            event_type: event.event_type,
            capacity: event.capacity,
            remaining_tickets: event.remaining_tickets,
            scanned_count: event.scanned_count,
            attendance_rate,
            organizers,
        }
    }
}

pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    pub event_type: String,
    pub capacity: i32,
    pub created_by: Uuid,
}
