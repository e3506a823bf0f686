//! Scheduling and participation rules.
//!
//! Both stores call into these checks while holding their write lock or
//! transaction, so a rule is evaluated against the same state it commits to.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::error::{EventError, EventResult};
use crate::models::{Event, User};

/// Where and when an event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule<'a> {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: &'a str,
}

impl Schedule<'_> {
    /// Same location and intersecting half-open `[start, end)` intervals.
    pub fn overlaps(&self, other: &Schedule<'_>) -> bool {
        self.location == other.location
            && other.start_time < self.end_time
            && other.end_time > self.start_time
    }
}

/// Interval ordering and future start. The overlap search is separate so the
/// Postgres store can run it as a query.
pub fn check_window(schedule: &Schedule<'_>, now: DateTime<Utc>) -> EventResult<()> {
    if schedule.start_time >= schedule.end_time {
        return Err(EventError::InvalidInterval);
    }
    if schedule.start_time <= now {
        return Err(EventError::PastStart);
    }
    Ok(())
}

/// Full validation of a candidate schedule against the persisted events.
///
/// `exclude` skips the event being updated so it cannot conflict with itself.
pub fn validate<'e, I>(
    schedule: &Schedule<'_>,
    existing: I,
    exclude: Option<Uuid>,
    now: DateTime<Utc>,
) -> EventResult<()>
where
    I: IntoIterator<Item = &'e Event>,
{
    check_window(schedule, now)?;

    let conflict = existing
        .into_iter()
        .filter(|event| Some(event.id) != exclude)
        .find(|event| event.schedule().overlaps(schedule));

    match conflict {
        Some(event) => {
            debug!(
                conflicting_event = %event.id,
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

/// Started events are read-only, whatever the change.
pub fn ensure_mutable(event: &Event, now: DateTime<Utc>) -> EventResult<()> {
    if event.has_started(now) {
        return Err(EventError::ImmutablePastEvent);
    }
    Ok(())
}

pub fn ensure_organizer(event: &Event, actor: &User) -> EventResult<()> {
    if !event.is_organizer(actor.id) {
        return Err(EventError::NotOrganizer);
    }
    Ok(())
}

pub fn ensure_can_register(event: &Event, user: &User, now: DateTime<Utc>) -> EventResult<()> {
    if event.is_organizer(user.id) {
        return Err(EventError::IsOrganizer);
    }
    if event.has_participant(user.id) {
        return Err(EventError::AlreadyRegistered);
    }
    if event.has_started(now) {
        return Err(EventError::EventAlreadyStarted);
    }
    Ok(())
}

pub fn ensure_registered(event: &Event, user: &User) -> EventResult<()> {
    if !event.has_participant(user.id) {
        return Err(EventError::NotRegistered);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, event, now, user};

    fn schedule<'a>(start: &str, end: &str, location: &'a str) -> Schedule<'a> {
        Schedule {
            start_time: at(start),
            end_time: at(end),
            location,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        let base = schedule("2024-12-20 08:00", "2024-12-20 10:00", "Hall A");

        assert!(base.overlaps(&schedule("2024-12-20 09:00", "2024-12-20 11:00", "Hall A")));
        assert!(base.overlaps(&schedule("2024-12-20 07:00", "2024-12-20 08:01", "Hall A")));
        assert!(base.overlaps(&schedule("2024-12-20 08:30", "2024-12-20 09:00", "Hall A")));
        assert!(base.overlaps(&schedule("2024-12-20 07:00", "2024-12-20 12:00", "Hall A")));

        // Touching intervals share no instant.
        assert!(!base.overlaps(&schedule("2024-12-20 10:00", "2024-12-20 11:00", "Hall A")));
        assert!(!base.overlaps(&schedule("2024-12-20 06:00", "2024-12-20 08:00", "Hall A")));
    }

    #[test]
    fn test_overlap_requires_same_location() {
        let base = schedule("2024-12-20 08:00", "2024-12-20 10:00", "Hall A");
        assert!(!base.overlaps(&schedule("2024-12-20 08:00", "2024-12-20 10:00", "Hall B")));
    }

    #[test]
    fn test_check_window_rejects_inverted_and_empty_intervals() {
        for (start, end) in [
            ("2024-12-20 10:00", "2024-12-20 09:00"),
            ("2024-12-20 10:00", "2024-12-20 10:00"),
        ] {
            let result = check_window(&schedule(start, end, "Hall A"), now());
            assert!(matches!(result, Err(EventError::InvalidInterval)));
        }
    }

    #[test]
    fn test_check_window_interval_reported_before_past_start() {
        let backwards = schedule("2023-12-13 12:00", "2023-12-13 11:00", "Hall A");
        let result = check_window(&backwards, now());
        assert!(matches!(result, Err(EventError::InvalidInterval)));
    }

    #[test]
    fn test_check_window_requires_strictly_future_start() {
        let at_now = Schedule {
            start_time: now(),
            end_time: at("2024-12-13 12:00"),
            location: "Hall A",
        };
        assert!(matches!(check_window(&at_now, now()), Err(EventError::PastStart)));

        let past = schedule("2023-12-13 12:00", "2023-12-13 14:00", "Hall A");
        assert!(matches!(check_window(&past, now()), Err(EventError::PastStart)));

        let future = schedule("2024-12-13 10:01", "2024-12-13 11:00", "Hall A");
        assert!(check_window(&future, now()).is_ok());
    }

    #[test]
    fn test_validate_detects_conflict_and_honours_exclusion() {
        let alice = user("alice");
        let existing = vec![event(
            "Launch",
            "Main Auditorium",
            at("2026-03-30 14:00"),
            at("2026-03-30 17:00"),
            &alice,
        )];
        let candidate = schedule("2026-03-30 16:00", "2026-03-30 18:00", "Main Auditorium");

        let result = validate(&candidate, &existing, None, now());
        assert!(matches!(
            result,
            Err(EventError::OverlappingEvent { ref location }) if location == "Main Auditorium"
        ));

        assert!(validate(&candidate, &existing, Some(existing[0].id), now()).is_ok());

        let elsewhere = schedule("2026-03-30 16:00", "2026-03-30 18:00", "Room 101");
        assert!(validate(&elsewhere, &existing, None, now()).is_ok());
    }

    #[test]
    fn test_registration_rules_in_order() {
        let alice = user("alice");
        let bob = user("bob");
        let mut upcoming = event(
            "Meetup",
            "Cafe",
            at("2024-12-20 08:00"),
            at("2024-12-20 09:00"),
            &alice,
        );

        assert!(matches!(
            ensure_can_register(&upcoming, &alice, now()),
            Err(EventError::IsOrganizer)
        ));
        assert!(ensure_can_register(&upcoming, &bob, now()).is_ok());

        upcoming.participants.push(bob.clone());
        assert!(matches!(
            ensure_can_register(&upcoming, &bob, now()),
            Err(EventError::AlreadyRegistered)
        ));
        assert!(ensure_registered(&upcoming, &bob).is_ok());
        assert!(matches!(ensure_registered(&upcoming, &alice), Err(EventError::NotRegistered)));

        let started = event(
            "Breakfast",
            "Cafe",
            at("2024-12-13 08:00"),
            at("2024-12-13 11:00"),
            &alice,
        );
        assert!(matches!(
            ensure_can_register(&started, &bob, now()),
            Err(EventError::EventAlreadyStarted)
        ));
    }

    #[test]
    fn test_ensure_mutable_and_organizer() {
        let alice = user("alice");
        let bob = user("bob");
        let started = event("Breakfast", "Cafe", now(), at("2024-12-13 11:00"), &alice);

        assert!(matches!(ensure_mutable(&started, now()), Err(EventError::ImmutablePastEvent)));
        assert!(ensure_organizer(&started, &alice).is_ok());
        assert!(matches!(ensure_organizer(&started, &bob), Err(EventError::NotOrganizer)));
    }
}
