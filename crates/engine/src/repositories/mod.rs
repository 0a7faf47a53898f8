//! Repository modules - Data access wrappers around port traits.
//!
//! Each repository wraps a port trait and provides the interface
//! for use cases to access persisted aggregates.
//!
//! Both aggregates live in the owning user's partition:
//!
//! | aggregate | pk | sk |
//! |---|---|---|
//! | character | `USER#<user_id>` | `CHAR#<character_id>` |
//! | session | `USER#<user_id>` | `SESS#<session_id>` |

pub mod character;
pub mod narrator;
pub mod session;

pub use character::CharacterRepository;
pub use narrator::{estimate_tokens, Narrator, NarratorReply};
pub use session::SessionRepository;

const CHARACTER_PREFIX: &str = "CHAR#";
const SESSION_PREFIX: &str = "SESS#";

fn user_partition(user_id: &str) -> String {
    format!("USER#{}", user_id)
}
