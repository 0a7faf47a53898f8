//! Game rules.
//!
//! Everything here is deterministic given the injected random source:
//!
//! - `bestiary` - static enemy templates and spawning
//! - `combat` - attack and round resolution
//! - `catalog` - static item catalog and name resolution
//! - `economy` - buy/sell rules applied to a character

pub mod bestiary;
pub mod catalog;
pub mod combat;
pub mod economy;
