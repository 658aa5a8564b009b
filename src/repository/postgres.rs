use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::event::{Event, EventSummary, NewEvent};
use crate::models::organizer::{PendingOrganizer, RequestStatus};
use crate::models::session::Session;
use crate::models::ticket::{ticket_code, AttendeeRow};
use crate::models::user::{NewUser, Role, User};
use crate::repository::{
    ClaimOutcome, CreateEventOutcome, CreateUserOutcome, DecideOutcome, EventRepository,
    OrganizerRequestRepository, RedeemOutcome, ReleaseOutcome, SessionRepository,
    SubmitRequestOutcome, UserRepository,
};
use crate::utils::error::{AppError, AppResult};

const EVENT_COLUMNS: &str = "id, title, description, event_date, event_time, location, \
     event_type, capacity, remaining_tickets, scanned_count, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, interests, created_at, updated_at";

/// All repository traits over one `PgPool`. Every ticket transition is a
/// conditional `UPDATE ... WHERE <expected current state>`, so concurrent
/// requests serialize on the row instead of double-spending it.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Groups organizer usernames per event and folds them into summaries.
    async fn summarize(&self, events: Vec<Event>) -> AppResult<Vec<EventSummary>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT eo.event_id, u.username \
             FROM event_organizers eo \
             JOIN users u ON u.id = eo.user_id \
             ORDER BY u.username",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (event_id, username) in rows {
            by_event.entry(event_id).or_default().push(username);
        }

        Ok(events
            .into_iter()
            .map(|event| {
                let organizers = by_event.remove(&event.id).unwrap_or_default();
                EventSummary::from_event(event, organizers)
            })
            .collect())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl EventRepository for PgRepository {
    async fn create_event(&self, event: NewEvent) -> AppResult<CreateEventOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO events \
                 (title, description, event_date, event_time, location, event_type, \
                  capacity, remaining_tickets) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING id",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(event.event_time)
        .bind(&event.location)
        .bind(&event.event_type)
        .bind(event.capacity)
        .fetch_one(&mut *tx)
        .await;

        let event_id = match inserted {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => return Ok(CreateEventOutcome::DuplicateTitle),
            Err(e) => return Err(e.into()),
        };

        let ordinals: Vec<i32> = (1..=event.capacity).collect();
        let codes: Vec<String> = ordinals
            .iter()
            .map(|&i| ticket_code(&event.title, i, event.capacity))
            .collect();

        sqlx::query(
            "INSERT INTO tickets (event_id, ordinal, code) \
             SELECT $1, t.ordinal, t.code \
             FROM UNNEST($2::int[], $3::text[]) AS t(ordinal, code)",
        )
        .bind(event_id)
        .bind(&ordinals)
        .bind(&codes)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO event_organizers (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(event.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CreateEventOutcome::Created(event_id))
    }

    async fn find_event(&self, id: Uuid) -> AppResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_events(&self) -> AppResult<Vec<EventSummary>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date, event_time"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.summarize(events).await
    }

    async fn events_for_user(&self, user_id: Uuid) -> AppResult<Vec<EventSummary>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE id IN (SELECT event_id FROM tickets WHERE assigned_to = $1) \
             ORDER BY event_date, event_time"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.summarize(events).await
    }

    async fn is_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM event_organizers WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn add_organizer(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO event_organizers (event_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim_ticket(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ClaimOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(ClaimOutcome::EventNotFound);
        }

        let already = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE event_id = $1 AND assigned_to = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Ok(ClaimOutcome::AlreadySignedUp);
        }

        let decremented = sqlx::query(
            "UPDATE events \
             SET remaining_tickets = remaining_tickets - 1, updated_at = now() \
             WHERE id = $1 AND remaining_tickets > 0",
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
        if decremented.rows_affected() == 0 {
            return Ok(ClaimOutcome::SoldOut);
        }

        // SKIP LOCKED keeps two concurrent claims from racing to the same
        // pool row; each takes its own.
        let code = sqlx::query_scalar::<_, String>(
            "UPDATE tickets SET assigned_to = $2 \
             WHERE id = ( \
                 SELECT id FROM tickets \
                 WHERE event_id = $1 AND assigned_to IS NULL AND NOT scanned \
                 ORDER BY ordinal \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING code",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match code {
            Some(code) => {
                tx.commit().await?;
                Ok(ClaimOutcome::Claimed { code })
            }
            None => {
                // Counter said tickets remained but the pool had none;
                // dropping the transaction rolls the decrement back.
                tx.rollback().await?;
                Ok(ClaimOutcome::SoldOut)
            }
        }
    }

    async fn redeem_ticket(&self, code: &str) -> AppResult<RedeemOutcome> {
        let mut tx = self.pool.begin().await?;

        let event_id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE tickets SET scanned = TRUE, scanned_at = now() \
             WHERE code = $1 AND scanned = FALSE \
             RETURNING event_id",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event_id) = event_id else {
            let known = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM tickets WHERE code = $1)",
            )
            .bind(code)
            .fetch_one(&mut *tx)
            .await?;
            return Ok(if known {
                RedeemOutcome::AlreadyScanned
            } else {
                RedeemOutcome::CodeNotFound
            });
        };

        let event_title = sqlx::query_scalar::<_, String>(
            "UPDATE events \
             SET scanned_count = scanned_count + 1, updated_at = now() \
             WHERE id = $1 \
             RETURNING title",
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RedeemOutcome::Redeemed { event_title })
    }

    async fn release_signup(&self, event_id: Uuid, user_id: Uuid) -> AppResult<ReleaseOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(ReleaseOutcome::EventNotFound);
        }

        let released = sqlx::query_scalar::<_, Uuid>(
            "UPDATE tickets SET assigned_to = NULL \
             WHERE event_id = $1 AND assigned_to = $2 AND NOT scanned \
             RETURNING id",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if released.is_none() {
            let holds_scanned = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM tickets \
                 WHERE event_id = $1 AND assigned_to = $2 AND scanned)",
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            return Ok(if holds_scanned {
                ReleaseOutcome::AlreadyScanned
            } else {
                ReleaseOutcome::NotSignedUp
            });
        }

        let incremented = sqlx::query(
            "UPDATE events \
             SET remaining_tickets = remaining_tickets + 1, updated_at = now() \
             WHERE id = $1 AND remaining_tickets < capacity",
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
        if incremented.rows_affected() == 0 {
            tracing::warn!(%event_id, "remaining_tickets already at capacity during release");
        }

        tx.commit().await?;
        Ok(ReleaseOutcome::Released)
    }

    async fn attendees(&self, event_id: Uuid) -> AppResult<Vec<AttendeeRow>> {
        let rows = sqlx::query_as::<_, AttendeeRow>(
            "SELECT u.username, u.email, t.code, t.scanned \
             FROM tickets t \
             JOIN users u ON u.id = t.assigned_to \
             WHERE t.event_id = $1 \
             ORDER BY t.ordinal",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<CreateUserOutcome> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email, password_hash, interests) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.interests)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(CreateUserOutcome::Created(id)),
            Err(e) if is_unique_violation(&e) => Ok(CreateUserOutcome::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> AppResult<()> {
        let updated = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Unscanned tickets go back to their pools before the account goes
        // away; scanned tickets keep their attendance count.
        sqlx::query(
            "UPDATE events e \
             SET remaining_tickets = LEAST(e.capacity, e.remaining_tickets + freed.cnt), \
                 updated_at = now() \
             FROM (SELECT event_id, COUNT(*) AS cnt \
                   FROM tickets \
                   WHERE assigned_to = $1 AND NOT scanned \
                   GROUP BY event_id) AS freed \
             WHERE e.id = freed.event_id",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE tickets SET assigned_to = NULL WHERE assigned_to = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }

    async fn favorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO favorites (user_id, event_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unfavorite(&self, user_id: Uuid, event_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn signed_up_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM tickets WHERE assigned_to = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn favorite_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT event_id FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl SessionRepository for PgRepository {
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> AppResult<Session> {
        let token = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + ttl;

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(Session {
            token,
            user_id,
            created_at: now,
            expires_at,
        })
    }

    async fn find_user_by_token(&self, token: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.password_hash, u.role, u.interests, \
                    u.created_at, u.updated_at \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrganizerRequestRepository for PgRepository {
    async fn submit_request(
        &self,
        user_id: Uuid,
        event_id: Option<Uuid>,
        request_type: &str,
    ) -> AppResult<SubmitRequestOutcome> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO organizer_requests (user_id, event_id, request_type) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(request_type)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(SubmitRequestOutcome::Submitted(id)),
            Err(e) if is_unique_violation(&e) => Ok(SubmitRequestOutcome::AlreadyPending),
            Err(e) => Err(e.into()),
        }
    }

    async fn pending_requests(&self) -> AppResult<Vec<PendingOrganizer>> {
        let rows = sqlx::query_as::<_, PendingOrganizer>(
            "SELECT r.user_id, u.username, u.email, r.request_type, r.event_id, r.submitted_at \
             FROM organizer_requests r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.status = 'pending' \
             ORDER BY r.submitted_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn decide_request(&self, user_id: Uuid, approve: bool) -> AppResult<DecideOutcome> {
        let status = if approve {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };

        let decided = sqlx::query_as::<_, (Option<Uuid>,)>(
            "UPDATE organizer_requests \
             SET status = $2, decided_at = now() \
             WHERE user_id = $1 AND status = 'pending' \
             RETURNING event_id",
        )
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match decided {
            Some((event_id,)) => DecideOutcome::Decided { event_id },
            None => DecideOutcome::NoPendingRequest,
        })
    }
}
