//! JRPG Battle Engine
//!
//! A turn-based battle engine for teams of combatants: a state machine that
//! sequences turns, resolves actions through a cost, effect and buff
//! pipeline, and keeps fighter ids dense as combatants fall or flee. A
//! `BattleRunner` drives a battle on its own thread with narration, pause
//! and cancel.

// --- MODULE DECLARATIONS ---
pub mod actions;
pub mod battle;
pub mod buffs;
pub mod combatant;
pub mod config;
pub mod content;
pub mod errors;
pub mod stats;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{ActionDefinition, AttributeGrowth, CombatantTemplate, StatGrowth, StatKind, Vital};

// Battle engine and its driver.
pub use battle::ai::RandomAi;
pub use battle::control::{BattleControl, Canceled};
pub use battle::engine::Battle;
pub use battle::narration::{BattleEvent, EventLog, Narrator, SilentNarrator};
pub use battle::runner::{BattleEnded, BattleHandle, BattleRunner, RunOutcome};
pub use battle::selection::{
    ActionSelector, ChannelSelector, SelectionPort, SelectionReply, SelectionRequest,
};
pub use battle::state::{BattleState, RemovalReason};

// Core runtime types for a battle.
pub use actions::{Action, ActionKind, ActionLibrary, Effect, SkillEffect};
pub use buffs::{Buff, BuffKind};
pub use combatant::{Combatant, CombatantRef};
pub use stats::{Stat, VariableStat};

// Content and configuration.
pub use config::BattleConfig;
pub use content::{CombatantFactory, ContentPack};

// Crate-specific error and result types.
pub use errors::{
    BattleEngineError, BattleResult, BattleSetupError, ConfigError, DefinitionError,
    DefinitionResult, RosterError, RosterResult,
};
