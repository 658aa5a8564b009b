use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::admin::{
    all_users, approve_organizer, delete_user, pending_organizers, reject_organizer,
    request_organizer,
};
use crate::handlers::auth::{register, signin, signout, user_profile};
use crate::handlers::events::{
    create_event, export_event_csv, favorite_event, list_events, my_events,
    remove_signedup_event, signup_event, unfavorite_event,
};
use crate::handlers::health::health_check;
use crate::handlers::tickets::validate_ticket;
use crate::middleware::ResponseStampLayer;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // accounts & sessions
        .route("/register", post(register))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/user-profile", get(user_profile))
        // events & tickets
        .route("/events", get(list_events))
        .route("/createEvent", post(create_event))
        .route("/signup-event", post(signup_event))
        .route("/remove-signedup-event", post(remove_signedup_event))
        .route("/validate-ticket", post(validate_ticket))
        .route("/favorite-event", post(favorite_event))
        .route("/unfavorite-event", post(unfavorite_event))
        .route("/my-events", get(my_events))
        .route("/export-event-csv/:event_id", get(export_event_csv))
        // organizer approval & administration
        .route("/request-organizer", post(request_organizer))
        .route("/pending-organizers", get(pending_organizers))
        .route("/approve-organizer", post(approve_organizer))
        .route("/reject-organizer", post(reject_organizer))
        .route("/all-users", get(all_users))
        .route("/delete-user/:user_id", delete(delete_user))
        .layer(TraceLayer::new_for_http())
        .layer(ResponseStampLayer::from_env())
        .layer(create_cors_layer())
        .with_state(state)
}
