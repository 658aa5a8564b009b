use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractor::CurrentUser;
use crate::models::event::NewEvent;
use crate::models::ticket::AttendeeRow;
use crate::repository::{
    ClaimOutcome, CreateEventOutcome, EventRepository, ReleaseOutcome, UserRepository,
};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub location: String,
    pub capacity: i32,
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Serialize)]
struct CreateEventPayload {
    #[serde(rename = "eventId")]
    event_id: Uuid,
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateEventRequest>,
) -> AppResult<Response> {
    if !user.can_organize() {
        return Err(AppError::Forbidden(
            "Only organizers can create events.".into(),
        ));
    }

    let title = request.title.trim().to_string();
    let location = request.location.trim().to_string();
    let event_type = request.event_type.trim().to_string();

    if title.is_empty()
        || location.is_empty()
        || event_type.is_empty()
        || request.date.trim().is_empty()
        || request.time.trim().is_empty()
    {
        return Err(AppError::ValidationError(
            "Please fill in all required fields.".into(),
        ));
    }
    if request.capacity <= 0 {
        return Err(AppError::ValidationError(
            "Ticket capacity must be greater than 0.".into(),
        ));
    }

    let event_date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError("Invalid event date; expected YYYY-MM-DD.".into()))?;
    let event_time = parse_event_time(request.time.trim())?;

    if event_date < Utc::now().date_naive() {
        return Err(AppError::ValidationError(
            "You cannot select a past date for the event.".into(),
        ));
    }

    let outcome = state
        .events
        .create_event(NewEvent {
            title,
            description: request.description.filter(|d| !d.trim().is_empty()),
            event_date,
            event_time,
            location,
            event_type,
            capacity: request.capacity,
            created_by: user.id(),
        })
        .await?;

    match outcome {
        CreateEventOutcome::Created(event_id) => {
            tracing::info!(%event_id, capacity = request.capacity, "Event created");
            Ok(created(
                CreateEventPayload { event_id },
                "Event created successfully.",
            ))
        }
        CreateEventOutcome::DuplicateTitle => Err(AppError::Conflict(
            "An event with this title already exists.".into(),
        )),
    }
}

fn parse_event_time(raw: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::ValidationError("Invalid event time; expected HH:MM.".into()))
}

pub async fn list_events(State(state): State<AppState>) -> AppResult<Response> {
    let events = state.events.list_events().await?;
    Ok(success(events, "Events retrieved successfully."))
}

#[derive(Deserialize)]
pub struct EventIdRequest {
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
}

#[derive(Serialize)]
struct SignupPayload {
    #[serde(rename = "qrCode")]
    qr_code: String,
}

pub async fn signup_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<EventIdRequest>,
) -> AppResult<Response> {
    let outcome = state
        .events
        .claim_ticket(request.event_id, user.id())
        .await?;

    match outcome {
        ClaimOutcome::Claimed { code } => {
            tracing::info!(event_id = %request.event_id, user_id = %user.id(), "Ticket claimed");
            Ok(success(
                SignupPayload { qr_code: code },
                "Ticket reserved! Present the QR code at the door.",
            ))
        }
        ClaimOutcome::SoldOut => Err(AppError::Conflict("Event is full.".into())),
        ClaimOutcome::AlreadySignedUp => Err(AppError::Conflict(
            "You have already signed up for this event.".into(),
        )),
        ClaimOutcome::EventNotFound => Err(AppError::NotFound("Event not found.".into())),
    }
}

pub async fn remove_signedup_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<EventIdRequest>,
) -> AppResult<Response> {
    let outcome = state
        .events
        .release_signup(request.event_id, user.id())
        .await?;

    match outcome {
        ReleaseOutcome::Released => Ok(empty_success("Event removed from your schedule.")),
        ReleaseOutcome::AlreadyScanned => Err(AppError::Conflict(
            "Your ticket has already been scanned and can no longer be returned.".into(),
        )),
        ReleaseOutcome::NotSignedUp => Err(AppError::NotFound(
            "You are not signed up for this event.".into(),
        )),
        ReleaseOutcome::EventNotFound => Err(AppError::NotFound("Event not found.".into())),
    }
}

pub async fn favorite_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<EventIdRequest>,
) -> AppResult<Response> {
    ensure_event_exists(&state, request.event_id).await?;
    state.users.favorite(user.id(), request.event_id).await?;
    Ok(empty_success("Event added to favorites."))
}

pub async fn unfavorite_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<EventIdRequest>,
) -> AppResult<Response> {
    ensure_event_exists(&state, request.event_id).await?;
    state.users.unfavorite(user.id(), request.event_id).await?;
    Ok(empty_success("Event removed from favorites."))
}

async fn ensure_event_exists(state: &AppState, event_id: Uuid) -> AppResult<()> {
    state
        .events
        .find_event(event_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Event not found.".into()))
}

pub async fn my_events(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let events = state.events.events_for_user(user.id()).await?;
    Ok(success(events, "Your events retrieved successfully."))
}

pub async fn export_event_csv(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<Uuid>,
) -> AppResult<Response> {
    ensure_event_exists(&state, event_id).await?;

    if !user.is_admin() && !state.events.is_organizer(event_id, user.id()).await? {
        return Err(AppError::Forbidden(
            "You do not organize this event.".into(),
        ));
    }

    let attendees = state.events.attendees(event_id).await?;
    let csv = attendees_csv(&attendees);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"event_{event_id}_attendees.csv\""),
        ),
    ];
    Ok((headers, csv).into_response())
}

fn attendees_csv(attendees: &[AttendeeRow]) -> String {
    let mut out = String::from("Username,Email,Ticket Code,Scanned\r\n");
    for row in attendees {
        out.push_str(&csv_field(&row.username));
        out.push(',');
        out.push_str(&csv_field(&row.email));
        out.push(',');
        out.push_str(&csv_field(&row.code));
        out.push(',');
        out.push_str(if row.scanned { "yes" } else { "no" });
        out.push_str("\r\n");
    }
    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
