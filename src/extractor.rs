use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::models::user::{Role, User};
use crate::repository::SessionRepository;
use crate::state::AppState;
use crate::utils::error::AppError;

pub const SESSION_COOKIE: &str = "quadpass_session";

const NOT_SIGNED_IN: &str = "You must be signed in.";

/// The authenticated caller, resolved from the session cookie before the
/// handler runs. Handlers that take a `CurrentUser` are session-gated by
/// construction.
pub struct CurrentUser {
    pub session_token: Uuid,
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    /// Organizer capabilities; admins hold them too, by explicit check
    /// rather than role inheritance.
    pub fn can_organize(&self) -> bool {
        matches!(self.user.role, Role::Organizer | Role::Admin)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::AuthError(NOT_SIGNED_IN.to_string()))?;

        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| AppError::AuthError(NOT_SIGNED_IN.to_string()))?;

        let session_token = Uuid::parse_str(cookie.value())
            .map_err(|_| AppError::AuthError(NOT_SIGNED_IN.to_string()))?;

        let user = state
            .sessions
            .find_user_by_token(session_token)
            .await?
            .ok_or_else(|| {
                AppError::AuthError("Your session has expired. Please sign in again.".to_string())
            })?;

        Ok(Self {
            session_token,
            user,
        })
    }
}
