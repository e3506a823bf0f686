pub mod event;
pub mod user;

pub use event::{Event, EventDraft, EventPatch};
pub use user::{NewUser, User};
