use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractor::{CurrentUser, SESSION_COOKIE};
use crate::models::user::{NewUser, Role, UserProfile};
use crate::repository::{CreateUserOutcome, SessionRepository, UserRepository};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Serialize)]
struct RegisterPayload {
    #[serde(rename = "userId")]
    user_id: Uuid,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Response> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(AppError::ValidationError(
            "Please fill in all required fields.".into(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::ValidationError(
            "Please enter a valid email address.".into(),
        ));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {e}")))?;

    let outcome = state
        .users
        .create_user(NewUser {
            username,
            email,
            password_hash,
            interests: request.interests,
        })
        .await?;

    match outcome {
        CreateUserOutcome::Created(user_id) => Ok(created(
            RegisterPayload { user_id },
            "Account created successfully.",
        )),
        CreateUserOutcome::DuplicateEmail => Err(AppError::Conflict(
            "An account with this email already exists.".into(),
        )),
    }
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct SigninPayload {
    username: String,
    email: String,
    role: Role,
}

pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SigninRequest>,
) -> AppResult<Response> {
    let invalid = || AppError::AuthError("Invalid email or password.".into());

    let email = request.email.trim().to_lowercase();
    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    let verified = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !verified {
        return Err(invalid());
    }

    let session = state
        .sessions
        .create_session(user.id, state.config.session_ttl)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let payload = SigninPayload {
        username: user.username,
        email: user.email,
        role: user.role,
    };

    Ok((jar.add(cookie), success(payload, "Signed in successfully.")).into_response())
}

pub async fn signout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> AppResult<Response> {
    state.sessions.delete_session(user.session_token).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, empty_success("Signed out successfully.")).into_response())
}

pub async fn user_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let signed_up_events = state.users.signed_up_event_ids(user.id()).await?;
    let favorite_events = state.users.favorite_event_ids(user.id()).await?;

    let profile = UserProfile {
        id: user.user.id,
        username: user.user.username,
        email: user.user.email,
        role: user.user.role,
        interests: user.user.interests,
        signed_up_events,
        favorite_events,
    };

    Ok(success(profile, "Profile retrieved successfully."))
}
