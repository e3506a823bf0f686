use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::domain::error::{EventError, EventResult, UserError, UserResult};
use crate::domain::query::EventQuery;
use crate::domain::rules::{self, Schedule};
use crate::models::{Event, EventDraft, EventPatch, NewUser, User};
use crate::store::{EventStore, UserStore};

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.title, e.description, e.start_time, e.end_time, e.location,
           e.created_at, e.updated_at,
           u.id AS organizer_id, u.username AS organizer_username,
           u.email AS organizer_email, u.created_at AS organizer_created_at
    FROM events e
    JOIN users u ON u.id = e.organizer_id
"#;

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    organizer_id: Uuid,
    organizer_username: String,
    organizer_email: String,
    organizer_created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self, participants: Vec<User>) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            organizer: User {
                id: self.organizer_id,
                username: self.organizer_username,
                email: self.organizer_email,
                created_at: self.organizer_created_at,
            },
            participants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ParticipantRow {
    event_id: Uuid,
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

/// Event store backed by Postgres.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_participants<'e, E>(
        executor: E,
        event_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<User>>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT p.event_id, u.id, u.username, u.email, u.created_at
            FROM event_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.event_id = ANY($1)
            ORDER BY p.registered_at, u.username
            "#,
        )
        .bind(event_ids)
        .fetch_all(executor)
        .await?;

        let mut by_event: HashMap<Uuid, Vec<User>> = HashMap::new();
        for row in rows {
            by_event.entry(row.event_id).or_default().push(User {
                id: row.id,
                username: row.username,
                email: row.email,
                created_at: row.created_at,
            });
        }
        Ok(by_event)
    }

    async fn hydrate(&self, rows: Vec<EventRow>) -> EventResult<Vec<Event>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut participants = Self::load_participants(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let users = participants.remove(&row.id).unwrap_or_default();
                row.into_event(users)
            })
            .collect())
    }

    async fn fetch(&self, id: Uuid) -> EventResult<Event> {
        self.get(id).await?.ok_or(EventError::NotFound(id))
    }

    /// Loads the event and locks its row for the rest of the transaction.
    async fn fetch_for_update(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> EventResult<Event> {
        let sql = format!("{EVENT_SELECT} WHERE e.id = $1 FOR UPDATE OF e");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(EventError::NotFound(id))?;

        let mut participants = Self::load_participants(&mut **tx, &[id]).await?;
        let users = participants.remove(&id).unwrap_or_default();
        Ok(row.into_event(users))
    }

    /// Serializes writers targeting the same location until commit.
    async fn lock_location(tx: &mut Transaction<'_, Postgres>, location: &str) -> EventResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(location)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Window check plus the overlap search, run under the location lock.
    async fn validate(
        tx: &mut Transaction<'_, Postgres>,
        schedule: &Schedule<'_>,
        exclude: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> EventResult<()> {
        rules::check_window(schedule, now)?;
        Self::lock_location(tx, schedule.location).await?;

        let conflict: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM events
            WHERE location = $1
              AND start_time < $3
              AND end_time > $2
              AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1
            "#,
        )
        .bind(schedule.location)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(exclude)
        .fetch_optional(&mut **tx)
        .await?;

        match conflict {
            Some(conflicting_event) => {
                tracing::debug!(
                    %conflicting_event,
                    location = %schedule.location,
                    "Schedule overlaps existing event"
                );
                Err(EventError::OverlappingEvent {
                    location: schedule.location.to_string(),
                })
            }
            None => Ok(()),
        }
    }
}

/// Builds the list query: filters, then upcoming-first ranking, then the
/// requested sort keys and `id`.
pub(crate) fn build_list_query(
    query: &EventQuery,
    viewer: Option<&User>,
    now: DateTime<Utc>,
) -> QueryBuilder<'static, Postgres> {
    let filter = &query.filter;
    let mut builder = QueryBuilder::new(EVENT_SELECT);
    builder.push(" WHERE TRUE");

    if let Some(title) = &filter.title {
        builder.push(" AND e.title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(organizer) = &filter.organizer {
        builder
            .push(" AND u.username ILIKE ")
            .push_bind(contains_pattern(organizer));
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND e.location ILIKE ")
            .push_bind(contains_pattern(location));
    }
    if let Some(date) = filter.start_date {
        builder
            .push(" AND (e.start_time AT TIME ZONE 'UTC')::date = ")
            .push_bind(date);
    }
    match (filter.participating, viewer) {
        (None, _) => {}
        (Some(true), Some(viewer)) => {
            builder
                .push(" AND EXISTS (SELECT 1 FROM event_participants p")
                .push(" WHERE p.event_id = e.id AND p.user_id = ")
                .push_bind(viewer.id)
                .push(")");
        }
        (Some(_), _) => {
            builder.push(" AND FALSE");
        }
    }
    match (filter.organizing, viewer) {
        (None, _) => {}
        (Some(true), Some(viewer)) => {
            builder.push(" AND e.organizer_id = ").push_bind(viewer.id);
        }
        (Some(_), _) => {
            builder.push(" AND FALSE");
        }
    }

    builder
        .push(" ORDER BY CASE WHEN e.start_time >= ")
        .push_bind(now)
        .push(" THEN 0 ELSE 1 END");
    for key in query.sort_keys() {
        builder
            .push(", e.")
            .push(key.field.column())
            .push(if key.descending { " DESC" } else { " ASC" });
    }
    builder.push(", e.id ASC");
    builder
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn get(&self, id: Uuid) -> EventResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("{EVENT_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        query: &EventQuery,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> EventResult<Vec<Event>> {
        let rows = build_list_query(query, viewer, now)
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn create(
        &self,
        draft: EventDraft,
        organizer: &User,
        now: DateTime<Utc>,
    ) -> EventResult<Event> {
        let mut tx = self.pool.begin().await?;
        Self::validate(&mut tx, &draft.schedule(), None, now).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO events
                (id, title, description, start_time, end_time, location, organizer_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(&draft.location)
        .bind(organizer.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(event_id = %id, organizer_id = %organizer.id, "Created event");

        self.fetch(id).await
    }

    async fn update(&self, id: Uuid, patch: EventPatch, now: DateTime<Utc>) -> EventResult<Event> {
        let mut tx = self.pool.begin().await?;
        let current = Self::fetch_for_update(&mut tx, id).await?;
        rules::ensure_mutable(&current, now)?;

        let merged = patch.merge(&current);
        Self::validate(&mut tx, &merged.schedule(), Some(id), now).await?;

        sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, start_time = $4, end_time = $5,
                location = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(merged.start_time)
        .bind(merged.end_time)
        .bind(&merged.location)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(event_id = %id, "Updated event");

        self.fetch(id).await
    }

    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn register(&self, id: Uuid, user: &User, now: DateTime<Utc>) -> EventResult<Event> {
        let mut tx = self.pool.begin().await?;
        let event = Self::fetch_for_update(&mut tx, id).await?;
        rules::ensure_can_register(&event, user, now)?;

        sqlx::query(
            "INSERT INTO event_participants (event_id, user_id, registered_at) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(user.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.fetch(id).await
    }

    async fn unregister(&self, id: Uuid, user: &User) -> EventResult<Event> {
        let mut tx = self.pool.begin().await?;
        let event = Self::fetch_for_update(&mut tx, id).await?;
        rules::ensure_registered(&event, user)?;

        sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.fetch(id).await
    }
}

/// User directory backed by Postgres.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser, now: DateTime<Utc>) -> UserResult<User> {
        let user = User::new(new_user, now);

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => {
                info!(user_id = %created.id, username = %created.username, "Created user");
                Ok(created)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                if db.constraint() == Some("users_email_key") {
                    Err(UserError::DuplicateEmail(user.email))
                } else {
                    Err(UserError::DuplicateUsername(user.username))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
