use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::extractor::CurrentUser;
use crate::repository::{EventRepository, RedeemOutcome};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success;

#[derive(Deserialize)]
pub struct ValidateTicketRequest {
    #[serde(rename = "qrData")]
    pub qr_data: String,
}

#[derive(Serialize)]
struct ValidationPayload {
    valid: bool,
    #[serde(rename = "eventTitle")]
    event_title: String,
}

/// Door scan. The code either redeems exactly once or the scanner is told
/// why it did not; a replayed code can never bump the attendance count a
/// second time.
pub async fn validate_ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ValidateTicketRequest>,
) -> AppResult<Response> {
    if !user.can_organize() {
        return Err(AppError::Forbidden(
            "Only organizers can validate tickets.".into(),
        ));
    }

    let code = request.qr_data.trim();
    if code.is_empty() {
        return Err(AppError::ValidationError(
            "No QR data was provided.".into(),
        ));
    }

    let outcome = state.events.redeem_ticket(code).await?;
    match outcome {
        RedeemOutcome::Redeemed { event_title } => {
            tracing::info!(%event_title, "Ticket scanned");
            Ok(success(
                ValidationPayload {
                    valid: true,
                    event_title,
                },
                "Ticket is valid. Welcome!",
            ))
        }
        RedeemOutcome::AlreadyScanned => Err(AppError::Conflict(
            "This ticket has already been scanned.".into(),
        )),
        RedeemOutcome::CodeNotFound => Err(AppError::NotFound("Ticket not found.".into())),
    }
}
