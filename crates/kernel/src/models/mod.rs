//! Persistent records and their query methods.

mod conference;
mod profile;
mod session;
mod speaker;

pub use conference::{Conference, CreateConference, UpdateConference};
pub use profile::{Profile, UpdateProfile};
pub use session::{CreateSession, Session};
pub use speaker::{CreateSpeaker, Speaker};
