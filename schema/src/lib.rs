// JRPG Battle Schema - Shared content definitions
// This crate holds the plain data types that content files are written in.
// The battle engine turns them into live stats, actions and combatants.

pub use action_data::*;
pub use combatant_data::*;
pub use stat_types::*;

pub mod action_data;
pub mod combatant_data;
pub mod stat_types;
