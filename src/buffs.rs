//! Timed modifiers attached to a fighting combatant.

use schema::{StatKind, Vital};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BuffKind {
    /// Multiplies a stat while active. Applied once on activation, undone on expiry.
    Modifier { stat: StatKind, multiplier: f64 },
    /// Changes a vital every time the owner's buffs are applied. Negative drains.
    Periodic { vital: Vital, amount: i32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Buff {
    /// Name of the action that granted it, for narration
    pub source: String,
    pub kind: BuffKind,
    pub turns_remaining: u32,
    /// Set once the buff has taken effect on its owner
    pub applied: bool,
}

impl Buff {
    pub fn new(source: impl Into<String>, kind: BuffKind, turns: u32) -> Self {
        Self {
            source: source.into(),
            kind,
            turns_remaining: turns,
            applied: false,
        }
    }

    pub fn modifier(source: impl Into<String>, stat: StatKind, multiplier: f64, turns: u32) -> Self {
        Self::new(source, BuffKind::Modifier { stat, multiplier }, turns)
    }

    pub fn periodic(source: impl Into<String>, vital: Vital, amount: i32, turns: u32) -> Self {
        Self::new(source, BuffKind::Periodic { vital, amount }, turns)
    }

    /// The stat this buff touches.
    pub fn stat(&self) -> StatKind {
        match self.kind {
            BuffKind::Modifier { stat, .. } => stat,
            BuffKind::Periodic { vital, .. } => vital.into(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.turns_remaining == 0
    }

    /// Count down one turn. Returns true once the buff has run out.
    pub fn tick(&mut self) -> bool {
        self.turns_remaining = self.turns_remaining.saturating_sub(1);
        self.is_expired()
    }
}

impl fmt::Display for Buff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BuffKind::Modifier { stat, multiplier } => {
                write!(f, "{} ({} x{:.2})", self.source, stat, multiplier)
            }
            BuffKind::Periodic { vital, amount } => {
                write!(f, "{} ({} {:+}/turn)", self.source, vital, amount)
            }
        }
    }
}

/// What happened to one buff during an apply pass.
#[derive(Debug, Clone, PartialEq)]
pub enum BuffTick {
    /// A modifier took effect for the first time
    Activated { buff: Buff },
    /// A periodic effect fired; `change` is the amount actually gained (negative: lost)
    Applied { buff: Buff, change: i32 },
}

/// Buff storage for one combatant while it fights.
///
/// Expired buffs stay readable for exactly one cycle so a UI can report each
/// expiry once: `expire` moves them aside, `clear_expired` drops them.
#[derive(Debug, Clone, Default)]
pub struct BuffBook {
    active: Vec<Buff>,
    expired: Vec<Buff>,
}

impl BuffBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, buff: Buff) {
        self.active.push(buff);
    }

    pub fn active(&self) -> &[Buff] {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut [Buff] {
        &mut self.active
    }

    pub fn expired(&self) -> &[Buff] {
        &self.expired
    }

    /// Tick every active buff and move the ones that ran out to the expired set.
    /// Returns the newly expired buffs.
    pub fn expire(&mut self) -> Vec<Buff> {
        let mut newly_expired = Vec::new();
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut buff in self.active.drain(..) {
            if buff.tick() {
                newly_expired.push(buff);
            } else {
                still_active.push(buff);
            }
        }
        self.active = still_active;
        self.expired.extend(newly_expired.iter().cloned());
        newly_expired
    }

    pub fn clear_expired(&mut self) {
        self.expired.clear();
    }

    /// Remove everything, handing back the active buffs so applied effects can be undone.
    pub fn drain_active(&mut self) -> Vec<Buff> {
        self.expired.clear();
        std::mem::take(&mut self.active)
    }
}
