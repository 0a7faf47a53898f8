//! Session use cases.
//!
//! Starting a play-through and reading back where it stands.

mod start;
mod view;

pub use start::{NewCharacter, SessionStarted, StartSession};
pub use view::{GetSessionView, SessionView};
