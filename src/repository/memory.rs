//! In-memory repository used by the unit tests. It mirrors the Postgres
//! implementation's semantics (one ticket per user, conditional
//! transitions, counter bounds) without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::event::{Event, EventSummary, NewEvent};
use crate::models::organizer::{OrganizerRequest, PendingOrganizer, RequestStatus};
use crate::models::session::Session;
use crate::models::ticket::{ticket_code, AttendeeRow, Ticket};
use crate::models::user::{NewUser, Role, User};
use crate::repository::{
    ClaimOutcome, CreateEventOutcome, CreateUserOutcome, DecideOutcome, EventRepository,
    OrganizerRequestRepository, RedeemOutcome, ReleaseOutcome, SessionRepository,
    SubmitRequestOutcome, UserRepository,
};
use crate::utils::error::{AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    events: HashMap<Uuid, Event>,
    tickets: Vec<Ticket>,
    /// (event_id, user_id)
    organizers: HashSet<(Uuid, Uuid)>,
    /// (user_id, event_id)
    favorites: HashSet<(Uuid, Uuid)>,
    requests: Vec<OrganizerRequest>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn summarize(state: &MemoryState, mut events: Vec<Event>) -> Vec<EventSummary> {
        events.sort_by_key(|e| (e.event_date, e.event_time));
        events
            .into_iter()
            .map(|event| {
                let mut organizers: Vec<String> = state
                    .organizers
                    .iter()
                    .filter(|(event_id, _)| *event_id == event.id)
                    .filter_map(|(_, user_id)| state.users.get(user_id))
                    .map(|u| u.username.clone())
                    .collect();
                organizers.sort();
                EventSummary::from_event(event, organizers)
            })
            .collect()
    }
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn create_event(&self, event: NewEvent) -> AppResult<CreateEventOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.events.values().any(|e| e.title == event.title) {
            return Ok(CreateEventOutcome::DuplicateTitle);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        for ordinal in 1..=event.capacity {
            state.tickets.push(Ticket {
                id: Uuid::new_v4(),
                event_id: id,
                ordinal,
                code: ticket_code(&event.title, ordinal, event.capacity),
                assigned_to: None,
                scanned: false,
                scanned_at: None,
            });
        }
        state.events.insert(
            id,
            Event {
                id,
                title: event.title,
                description: event.description,
                event_date: event.event_date,
                event_time: event.event_time,
                location: event.location,
                event_type: event.event_type,
                capacity: event.capacity,
                remaining_tickets: event.capacity,
                scanned_count: 0,
                created_at: now,
                updated_at: now,
            },
        );
        state.organizers.insert((id, event.created_by));
        Ok(CreateEventOutcome::Created(id))
    }

    async fn find_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        let state = self.state.lock().unwrap();
        Ok(state.events.get(&id).cloned())
    }

    async fn list_events(&self) -> AppResult<Vec<EventSummary>> {
        let state = self.state.lock().unwrap();
        let events: Vec<Event> = state.events.values().cloned().collect();
        Ok(Self::summarize(&state, events))
    }

    async fn events_for_user(&self, user_id: Uuid) -> AppResult<Vec<EventSummary>> {
        let state = self.state.lock().unwrap();
        let held: HashSet<Uuid> = state
            .tickets
            .iter()
            .filter(|t| t.assigned_to == Some(user_id))
            .map(|t| t.event_id)
            .collect();
        let events: Vec<Event> = state
            .events
            .values()
            .filter(|e| held.contains(&e.id))
            .cloned()
            .collect();
        Ok(Self::summarize(&state, events))
    }

    async fn is_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.organizers.contains(&(event_id, user_id)))
    }

    async fn add_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.organizers.insert((event_id, user_id));
        Ok(())
    }

    async fn claim_ticket(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ClaimOutcome> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if !state.events.contains_key(&event_id) {
            return Ok(ClaimOutcome::EventNotFound);
        }
        if state
            .tickets
            .iter()
            .any(|t| t.event_id == event_id && t.assigned_to == Some(user_id))
        {
            return Ok(ClaimOutcome::AlreadySignedUp);
        }

        let remaining = state.events[&event_id].remaining_tickets;
        let pool_slot = state
            .tickets
            .iter_mut()
            .filter(|t| t.event_id == event_id && t.assigned_to.is_none() && !t.scanned)
            .min_by_key(|t| t.ordinal);

        match pool_slot {
            Some(ticket) if remaining > 0 => {
                ticket.assigned_to = Some(user_id);
                let code = ticket.code.clone();
                let event = state.events.get_mut(&event_id).unwrap();
                event.remaining_tickets -= 1;
                event.updated_at = Utc::now();
                Ok(ClaimOutcome::Claimed { code })
            }
            _ => Ok(ClaimOutcome::SoldOut),
        }
    }

    async fn redeem_ticket(&self, code: &str) -> AppResult<RedeemOutcome> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let Some(ticket) = state.tickets.iter_mut().find(|t| t.code == code) else {
            return Ok(RedeemOutcome::CodeNotFound);
        };
        if ticket.scanned {
            return Ok(RedeemOutcome::AlreadyScanned);
        }
        ticket.scanned = true;
        ticket.scanned_at = Some(Utc::now());
        let event_id = ticket.event_id;

        let event = state.events.get_mut(&event_id).unwrap();
        event.scanned_count += 1;
        event.updated_at = Utc::now();
        Ok(RedeemOutcome::Redeemed {
            event_title: event.title.clone(),
        })
    }

    async fn release_signup(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ReleaseOutcome> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if !state.events.contains_key(&event_id) {
            return Ok(ReleaseOutcome::EventNotFound);
        }

        let held = state
            .tickets
            .iter_mut()
            .find(|t| t.event_id == event_id && t.assigned_to == Some(user_id));
        match held {
            Some(ticket) if !ticket.scanned => {
                ticket.assigned_to = None;
                let event = state.events.get_mut(&event_id).unwrap();
                if event.remaining_tickets < event.capacity {
                    event.remaining_tickets += 1;
                }
                event.updated_at = Utc::now();
                Ok(ReleaseOutcome::Released)
            }
            Some(_) => Ok(ReleaseOutcome::AlreadyScanned),
            None => Ok(ReleaseOutcome::NotSignedUp),
        }
    }

    async fn attendees(&self, event_id: Uuid) -> AppResult<Vec<AttendeeRow>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<(i32, AttendeeRow)> = state
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .filter_map(|t| {
                let user = state.users.get(&t.assigned_to?)?;
                Some((
                    t.ordinal,
                    AttendeeRow {
                        username: user.username.clone(),
                        email: user.email.clone(),
                        code: t.code.clone(),
                        scanned: t.scanned,
                    },
                ))
            })
            .collect();
        rows.sort_by_key(|(ordinal, _)| *ordinal);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<CreateUserOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(CreateUserOutcome::DuplicateEmail);
        }
        let id = Uuid::new_v4();
        let now = Utc::now();
        state.users.insert(
            id,
            User {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                role: Role::Student,
                interests: user.interests,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(CreateUserOutcome::Created(id))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.users.remove(&user_id).is_none() {
            return Ok(false);
        }

        let mut freed: HashMap<Uuid, i32> = HashMap::new();
        for ticket in state
            .tickets
            .iter_mut()
            .filter(|t| t.assigned_to == Some(user_id))
        {
            if !ticket.scanned {
                *freed.entry(ticket.event_id).or_default() += 1;
            }
            ticket.assigned_to = None;
        }
        for (event_id, count) in freed {
            if let Some(event) = state.events.get_mut(&event_id) {
                event.remaining_tickets = (event.remaining_tickets + count).min(event.capacity);
            }
        }

        state.sessions.retain(|_, s| s.user_id != user_id);
        state.favorites.retain(|(uid, _)| *uid != user_id);
        state.organizers.retain(|(_, uid)| *uid != user_id);
        state.requests.retain(|r| r.user_id != user_id);
        Ok(true)
    }

    async fn favorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.favorites.insert((user_id, event_id));
        Ok(())
    }

    async fn unfavorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.favorites.remove(&(user_id, event_id));
        Ok(())
    }

    async fn signed_up_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.assigned_to == Some(user_id))
            .map(|t| t.event_id)
            .collect())
    }

    async fn favorite_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .favorites
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, event_id)| *event_id)
            .collect())
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> AppResult<Session> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        };
        state.sessions.insert(session.token, session.clone());
        Ok(session)
    }

    async fn find_user_by_token(&self, token: Uuid) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        let Some(session) = state.sessions.get(&token) else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(state.users.get(&session.user_id).cloned())
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.sessions.remove(&token);
        Ok(())
    }
}

#[async_trait]
impl OrganizerRequestRepository for MemoryRepository {
    async fn submit_request(
        &self,
        user_id: Uuid,
        event_id: Option<Uuid>,
        request_type: &str,
    ) -> AppResult<SubmitRequestOutcome> {
        let mut state = self.state.lock().unwrap();
        if state
            .requests
            .iter()
            .any(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
        {
            return Ok(SubmitRequestOutcome::AlreadyPending);
        }
        let id = Uuid::new_v4();
        state.requests.push(OrganizerRequest {
            id,
            user_id,
            event_id,
            request_type: request_type.to_string(),
            status: RequestStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
        });
        Ok(SubmitRequestOutcome::Submitted(id))
    }

    async fn pending_requests(&self) -> AppResult<Vec<PendingOrganizer>> {
        let state = self.state.lock().unwrap();
        let mut pending: Vec<&OrganizerRequest> = state
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect();
        pending.sort_by_key(|r| r.submitted_at);
        Ok(pending
            .into_iter()
            .filter_map(|r| {
                let user = state.users.get(&r.user_id)?;
                Some(PendingOrganizer {
                    user_id: r.user_id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    request_type: r.request_type.clone(),
                    event_id: r.event_id,
                    submitted_at: r.submitted_at,
                })
            })
            .collect())
    }

    async fn decide_request(&self, user_id: Uuid, approve: bool) -> AppResult<DecideOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(request) = state
            .requests
            .iter_mut()
            .find(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
        else {
            return Ok(DecideOutcome::NoPendingRequest);
        };
        request.status = if approve {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        request.decided_at = Some(Utc::now());
        Ok(DecideOutcome::Decided {
            event_id: request.event_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn new_event(title: &str, capacity: i32, created_by: Uuid) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2027, 3, 12).unwrap(),
            event_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            location: "Hall Building".into(),
            event_type: "social".into(),
            capacity,
            created_by,
        }
    }

    async fn seed_user(repo: &MemoryRepository, email: &str) -> Uuid {
        match repo
            .create_user(NewUser {
                username: email.split('@').next().unwrap().to_string(),
                email: email.to_string(),
                password_hash: "hash".into(),
                interests: vec![],
            })
            .await
            .unwrap()
        {
            CreateUserOutcome::Created(id) => id,
            CreateUserOutcome::DuplicateEmail => panic!("seed user collided"),
        }
    }

    async fn seed_event(repo: &MemoryRepository, title: &str, capacity: i32) -> Uuid {
        let organizer = seed_user(repo, &format!("org-{title}@campus.edu")).await;
        match repo
            .create_event(new_event(title, capacity, organizer))
            .await
            .unwrap()
        {
            CreateEventOutcome::Created(id) => id,
            CreateEventOutcome::DuplicateTitle => panic!("seed event collided"),
        }
    }

    #[tokio::test]
    async fn creation_fills_the_pool() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Career Fair", 3).await;

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.capacity, 3);
        assert_eq!(event.remaining_tickets, 3);
        assert_eq!(event.scanned_count, 0);

        let state = repo.state.lock().unwrap();
        let codes: Vec<&str> = state
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .map(|t| t.code.as_str())
            .collect();
        assert_eq!(codes.len(), 3);
        assert!(codes.contains(&"Career Fair - 1/3"));
        assert!(state
            .tickets
            .iter()
            .all(|t| t.assigned_to.is_none() && !t.scanned));
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected() {
        let repo = MemoryRepository::new();
        seed_event(&repo, "Career Fair", 3).await;
        let organizer = seed_user(&repo, "second@campus.edu").await;
        let outcome = repo
            .create_event(new_event("Career Fair", 5, organizer))
            .await
            .unwrap();
        assert_eq!(outcome, CreateEventOutcome::DuplicateTitle);
    }

    #[tokio::test]
    async fn full_ticket_lifecycle() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Engineering Gala", 3).await;
        let student = seed_user(&repo, "ada@campus.edu").await;

        let claim = repo.claim_ticket(event_id, student).await.unwrap();
        let ClaimOutcome::Claimed { code } = claim else {
            panic!("expected a claimed ticket, got {claim:?}");
        };

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 2);

        let redeem = repo.redeem_ticket(&code).await.unwrap();
        assert_eq!(
            redeem,
            RedeemOutcome::Redeemed {
                event_title: "Engineering Gala".into()
            }
        );

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.scanned_count, 1);
        assert_eq!(event.attendance_rate(), 33.3);

        // Replay: must fail and never double-count.
        let replay = repo.redeem_ticket(&code).await.unwrap();
        assert_eq!(replay, RedeemOutcome::AlreadyScanned);
        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.scanned_count, 1);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let repo = MemoryRepository::new();
        seed_event(&repo, "Engineering Gala", 1).await;
        let outcome = repo.redeem_ticket("no such code").await.unwrap();
        assert_eq!(outcome, RedeemOutcome::CodeNotFound);
    }

    #[tokio::test]
    async fn second_signup_is_rejected_without_issuing() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Hack Night", 5).await;
        let student = seed_user(&repo, "ada@campus.edu").await;

        assert!(matches!(
            repo.claim_ticket(event_id, student).await.unwrap(),
            ClaimOutcome::Claimed { .. }
        ));
        assert_eq!(
            repo.claim_ticket(event_id, student).await.unwrap(),
            ClaimOutcome::AlreadySignedUp
        );

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 4);
    }

    #[tokio::test]
    async fn sold_out_leaves_state_unchanged() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Tiny Workshop", 1).await;
        let first = seed_user(&repo, "a@campus.edu").await;
        let second = seed_user(&repo, "b@campus.edu").await;

        assert!(matches!(
            repo.claim_ticket(event_id, first).await.unwrap(),
            ClaimOutcome::Claimed { .. }
        ));
        assert_eq!(
            repo.claim_ticket(event_id, second).await.unwrap(),
            ClaimOutcome::SoldOut
        );

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 0);
        assert_eq!(
            repo.signed_up_event_ids(second).await.unwrap(),
            Vec::<Uuid>::new()
        );
    }

    #[tokio::test]
    async fn release_returns_the_same_ticket_to_the_pool() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Jazz Evening", 1).await;
        let first = seed_user(&repo, "a@campus.edu").await;
        let second = seed_user(&repo, "b@campus.edu").await;

        let ClaimOutcome::Claimed { code: first_code } =
            repo.claim_ticket(event_id, first).await.unwrap()
        else {
            panic!("first claim failed");
        };

        assert_eq!(
            repo.release_signup(event_id, first).await.unwrap(),
            ReleaseOutcome::Released
        );
        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 1);

        // The freed slot is the very ticket that was released.
        let ClaimOutcome::Claimed { code: second_code } =
            repo.claim_ticket(event_id, second).await.unwrap()
        else {
            panic!("reclaim after release failed");
        };
        assert_eq!(first_code, second_code);
    }

    #[tokio::test]
    async fn scanned_ticket_cannot_be_released() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Jazz Evening", 2).await;
        let student = seed_user(&repo, "a@campus.edu").await;

        let ClaimOutcome::Claimed { code } = repo.claim_ticket(event_id, student).await.unwrap()
        else {
            panic!("claim failed");
        };
        repo.redeem_ticket(&code).await.unwrap();

        assert_eq!(
            repo.release_signup(event_id, student).await.unwrap(),
            ReleaseOutcome::AlreadyScanned
        );
        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 1);
    }

    #[tokio::test]
    async fn remaining_tickets_stays_within_bounds() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Bounded", 2).await;
        let student = seed_user(&repo, "a@campus.edu").await;

        assert_eq!(
            repo.release_signup(event_id, student).await.unwrap(),
            ReleaseOutcome::NotSignedUp
        );
        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 2);

        for _ in 0..2 {
            repo.claim_ticket(event_id, student).await.unwrap();
            repo.release_signup(event_id, student).await.unwrap();
            let event = repo.find_event(event_id).await.unwrap().unwrap();
            assert!(event.remaining_tickets >= 0 && event.remaining_tickets <= event.capacity);
        }
    }

    #[tokio::test]
    async fn deleting_a_user_frees_their_unscanned_tickets() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Open Mic", 2).await;
        let student = seed_user(&repo, "a@campus.edu").await;

        repo.claim_ticket(event_id, student).await.unwrap();
        assert!(repo.delete_user(student).await.unwrap());

        let event = repo.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.remaining_tickets, 2);
        assert!(repo.find_user(student).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn organizer_request_flow() {
        let repo = MemoryRepository::new();
        let event_id = seed_event(&repo, "Club Fair", 10).await;
        let student = seed_user(&repo, "lea@campus.edu").await;

        assert!(matches!(
            repo.submit_request(student, Some(event_id), "event organizer")
                .await
                .unwrap(),
            SubmitRequestOutcome::Submitted(_)
        ));
        assert_eq!(
            repo.submit_request(student, None, "event organizer")
                .await
                .unwrap(),
            SubmitRequestOutcome::AlreadyPending
        );

        let pending = repo.pending_requests().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].username, "lea");

        assert_eq!(
            repo.decide_request(student, true).await.unwrap(),
            DecideOutcome::Decided {
                event_id: Some(event_id)
            }
        );
        // Decided requests are closed; a second decision finds nothing.
        assert_eq!(
            repo.decide_request(student, true).await.unwrap(),
            DecideOutcome::NoPendingRequest
        );
        assert!(repo.pending_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let repo = MemoryRepository::new();
        let user_id = seed_user(&repo, "a@campus.edu").await;

        let live = repo
            .create_session(user_id, Duration::days(7))
            .await
            .unwrap();
        assert!(repo
            .find_user_by_token(live.token)
            .await
            .unwrap()
            .is_some());

        let expired = repo
            .create_session(user_id, Duration::seconds(-1))
            .await
            .unwrap();
        assert!(repo
            .find_user_by_token(expired.token)
            .await
            .unwrap()
            .is_none());

        repo.delete_session(live.token).await.unwrap();
        assert!(repo.find_user_by_token(live.token).await.unwrap().is_none());
    }
}
