use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::extractor::CurrentUser;
use crate::models::user::Role;
use crate::repository::{
    DecideOutcome, EventRepository, OrganizerRequestRepository, SubmitRequestOutcome,
    UserRepository,
};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator access required.".into()))
    }
}

#[derive(Deserialize)]
pub struct RequestOrganizerRequest {
    #[serde(rename = "eventId")]
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(rename = "type")]
    #[serde(default)]
    pub request_type: Option<String>,
}

pub async fn request_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<RequestOrganizerRequest>,
) -> AppResult<Response> {
    if user.can_organize() {
        return Err(AppError::Conflict(
            "You already have organizer access.".into(),
        ));
    }

    if let Some(event_id) = request.event_id {
        if state.events.find_event(event_id).await?.is_none() {
            return Err(AppError::NotFound("Event not found.".into()));
        }
    }

    let request_type = request
        .request_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("organizer");

    let outcome = state
        .requests
        .submit_request(user.id(), request.event_id, request_type)
        .await?;

    match outcome {
        SubmitRequestOutcome::Submitted(_) => {
            Ok(created((), "Your request has been submitted for review."))
        }
        SubmitRequestOutcome::AlreadyPending => Err(AppError::Conflict(
            "You already have a pending request.".into(),
        )),
    }
}

pub async fn pending_organizers(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    require_admin(&user)?;
    let pending = state.requests.pending_requests().await?;
    Ok(success(pending, "Pending requests retrieved successfully."))
}

#[derive(Deserialize)]
pub struct DecideOrganizerRequest {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "eventId")]
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

pub async fn approve_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<DecideOrganizerRequest>,
) -> AppResult<Response> {
    require_admin(&user)?;

    let outcome = state.requests.decide_request(request.user_id, true).await?;
    let DecideOutcome::Decided { event_id } = outcome else {
        return Err(AppError::NotFound(
            "No pending organizer request for this user.".into(),
        ));
    };

    state.users.set_role(request.user_id, Role::Organizer).await?;

    // The recorded request wins; the payload's eventId only fills in for
    // requests submitted without one.
    if let Some(event_id) = event_id.or(request.event_id) {
        if state.events.find_event(event_id).await?.is_some() {
            state.events.add_organizer(event_id, request.user_id).await?;
        }
    }

    tracing::info!(user_id = %request.user_id, "Organizer request approved");
    Ok(empty_success("Organizer request approved."))
}

pub async fn reject_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<DecideOrganizerRequest>,
) -> AppResult<Response> {
    require_admin(&user)?;

    match state.requests.decide_request(request.user_id, false).await? {
        DecideOutcome::Decided { .. } => Ok(empty_success("Organizer request rejected.")),
        DecideOutcome::NoPendingRequest => Err(AppError::NotFound(
            "No pending organizer request for this user.".into(),
        )),
    }
}

pub async fn all_users(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    require_admin(&user)?;
    let users = state.users.list_users().await?;
    Ok(success(users, "Users retrieved successfully."))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Response> {
    require_admin(&user)?;

    if user_id == user.id() {
        return Err(AppError::Conflict(
            "You cannot delete your own account.".into(),
        ));
    }

    if !state.users.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found.".into()));
    }

    tracing::info!(%user_id, "User deleted");
    Ok(empty_success("User deleted successfully."))
}
