use thiserror::Error;
use uuid::Uuid;

pub type EventResult<T> = Result<T, EventError>;
pub type UserResult<T> = Result<T, UserError>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event starting time must be before its ending time.")]
    InvalidInterval,

    #[error("Event starting time must be in the future.")]
    PastStart,

    #[error("An event at '{location}' overlaps with this time period.")]
    OverlappingEvent { location: String },

    #[error("This event has already started or is finished and cannot be updated.")]
    ImmutablePastEvent,

    #[error("You are the organizer of this event.")]
    IsOrganizer,

    #[error("You are already registered for this event.")]
    AlreadyRegistered,

    #[error("This event has already started.")]
    EventAlreadyStarted,

    #[error("You are not registered for this event.")]
    NotRegistered,

    #[error("Event with id '{0}' was not found")]
    NotFound(Uuid),

    #[error("Only the organizer may modify this event")]
    NotOrganizer,

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl EventError {
    pub fn code(&self) -> &'static str {
        match self {
            EventError::InvalidInterval => "INVALID_INTERVAL",
            EventError::PastStart => "PAST_START",
            EventError::OverlappingEvent { .. } => "OVERLAPPING_EVENT",
            EventError::ImmutablePastEvent => "IMMUTABLE_PAST_EVENT",
            EventError::IsOrganizer => "IS_ORGANIZER",
            EventError::AlreadyRegistered => "ALREADY_REGISTERED",
            EventError::EventAlreadyStarted => "EVENT_ALREADY_STARTED",
            EventError::NotRegistered => "NOT_REGISTERED",
            EventError::NotFound(_) => "NOT_FOUND",
            EventError::NotOrganizer => "FORBIDDEN",
            EventError::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("A user with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("A user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}
