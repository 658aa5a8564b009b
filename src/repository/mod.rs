use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::models::event::{Event, EventSummary, NewEvent};
use crate::models::organizer::PendingOrganizer;
use crate::models::session::Session;
use crate::models::ticket::AttendeeRow;
use crate::models::user::{NewUser, Role, User};
use crate::utils::error::AppResult;

pub mod postgres;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateEventOutcome {
    Created(Uuid),
    DuplicateTitle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A pool ticket was bound to the user; the code doubles as QR payload.
    Claimed { code: String },
    SoldOut,
    AlreadySignedUp,
    EventNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed { event_title: String },
    AlreadyScanned,
    CodeNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    AlreadyScanned,
    NotSignedUp,
    EventNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(Uuid),
    DuplicateEmail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequestOutcome {
    Submitted(Uuid),
    AlreadyPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecideOutcome {
    Decided { event_id: Option<Uuid> },
    NoPendingRequest,
}

/// Events and their ticket pools. `claim_ticket`, `redeem_ticket` and
/// `release_signup` are the state machine of the system; implementations
/// must apply them as conditional updates so that two concurrent requests
/// can never both observe the same available ticket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Inserts the event, its full ticket pool and the creator's organizer
    /// membership in one transaction.
    async fn create_event(&self, event: NewEvent) -> AppResult<CreateEventOutcome>;

    async fn find_event(&self, id: Uuid) -> AppResult<Option<Event>>;

    async fn list_events(&self) -> AppResult<Vec<EventSummary>>;

    /// Events the user currently holds a ticket for.
    async fn events_for_user(&self, user_id: Uuid) -> AppResult<Vec<EventSummary>>;

    async fn is_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn add_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Binds one unassigned, unscanned ticket to the user and decrements
    /// `remaining_tickets`, or reports why it cannot.
    async fn claim_ticket(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ClaimOutcome>;

    /// Marks the ticket scanned exactly once and bumps the event's scanned
    /// count. Replaying a code always yields `AlreadyScanned`.
    async fn redeem_ticket(&self, code: &str) -> AppResult<RedeemOutcome>;

    /// Returns the user's unscanned ticket to the pool and increments
    /// `remaining_tickets`, in one transaction.
    async fn release_signup(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ReleaseOutcome>;

    /// Ticket holders of an event, for the CSV export.
    async fn attendees(&self, event_id: Uuid) -> AppResult<Vec<AttendeeRow>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<CreateUserOutcome>;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn set_role(&self, user_id: Uuid, role: Role) -> AppResult<()>;

    /// Releases the user's unscanned tickets back to their pools, then
    /// deletes the account. Returns false when the user did not exist.
    async fn delete_user(&self, user_id: Uuid) -> AppResult<bool>;

    async fn favorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()>;

    async fn unfavorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()>;

    async fn signed_up_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn favorite_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> AppResult<Session>;

    /// Resolves a cookie token to its user, ignoring expired sessions.
    async fn find_user_by_token(&self, token: Uuid) -> AppResult<Option<User>>;

    async fn delete_session(&self, token: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizerRequestRepository: Send + Sync {
    /// One pending request per user; a second submission while one is
    /// pending reports `AlreadyPending`.
    async fn submit_request(
        &self,
        user_id: Uuid,
        event_id: Option<Uuid>,
        request_type: &str,
    ) -> AppResult<SubmitRequestOutcome>;

    async fn pending_requests(&self) -> AppResult<Vec<PendingOrganizer>>;

    /// Flips the user's pending request to approved or rejected and hands
    /// back the event it referenced, if any.
    async fn decide_request(&self, user_id: Uuid, approve: bool) -> AppResult<DecideOutcome>;
}
