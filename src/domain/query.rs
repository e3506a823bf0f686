//! Filtering and ranking of the event list.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::models::{Event, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Location,
    StartTime,
    EndTime,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Location => "location",
            SortField::StartTime => "start_time",
            SortField::EndTime => "end_time",
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortField::Title),
            "location" => Ok(SortField::Location),
            "start_time" => Ok(SortField::StartTime),
            "end_time" => Ok(SortField::EndTime),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Parses `"-title,location"`. Unknown fields are skipped.
    pub fn parse_list(raw: &str) -> Vec<SortKey> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                let (descending, name) = match part.strip_prefix('-') {
                    Some(name) => (true, name),
                    None => (false, part),
                };
                match name.parse::<SortField>() {
                    Ok(field) => Some(SortKey { field, descending }),
                    Err(()) => {
                        debug!(ordering = %part, "Ignoring unknown ordering field");
                        None
                    }
                }
            })
            .collect()
    }

    fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let ordering = match self.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Location => a.location.cmp(&b.location),
            SortField::StartTime => a.start_time.cmp(&b.start_time),
            SortField::EndTime => a.end_time.cmp(&b.end_time),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

const DEFAULT_ORDERING: [SortKey; 1] = [SortKey::asc(SortField::StartTime)];

/// List filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub title: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub participating: Option<bool>,
    pub organizing: Option<bool>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event, viewer: Option<&User>) -> bool {
        contains(&event.title, self.title.as_deref())
            && contains(&event.organizer.username, self.organizer.as_deref())
            && contains(&event.location, self.location.as_deref())
            && self
                .start_date
                .map_or(true, |date| event.start_time.date_naive() == date)
            && viewer_scope(self.participating, viewer, |v| event.has_participant(v.id))
            && viewer_scope(self.organizing, viewer, |v| event.is_organizer(v.id))
    }
}

fn contains(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Viewer-relative flags only narrow: `true` keeps the viewer's events, any
/// other supplied value (or an anonymous viewer) keeps nothing.
fn viewer_scope(flag: Option<bool>, viewer: Option<&User>, keep: impl Fn(&User) -> bool) -> bool {
    match (flag, viewer) {
        (None, _) => true,
        (Some(true), Some(viewer)) => keep(viewer),
        (Some(_), _) => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub filter: EventFilter,
    pub ordering: Vec<SortKey>,
}

impl EventQuery {
    /// Requested keys, or `start_time` ascending when none were given.
    pub fn sort_keys(&self) -> &[SortKey] {
        if self.ordering.is_empty() {
            &DEFAULT_ORDERING
        } else {
            &self.ordering
        }
    }
}

/// 0 for upcoming events, 1 for events that already started.
pub fn rank(event: &Event, now: DateTime<Utc>) -> u8 {
    if event.is_upcoming(now) {
        0
    } else {
        1
    }
}

/// Filters `events` and orders them: upcoming first, then by the sort keys,
/// then by id.
pub fn query<I>(
    events: I,
    query: &EventQuery,
    viewer: Option<&User>,
    now: DateTime<Utc>,
) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    let mut selected: Vec<Event> = events
        .into_iter()
        .filter(|event| query.filter.matches(event, viewer))
        .collect();

    let keys = query.sort_keys();
    selected.sort_by(|a, b| {
        rank(a, now)
            .cmp(&rank(b, now))
            .then_with(|| {
                keys.iter()
                    .map(|key| key.compare(a, b))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    selected
}
