//! Turn-by-turn narration of a running battle.
//!
//! The runner calls one `Narrator` method per thing that happened. Every
//! method has a default that builds the matching `BattleEvent` and hands it
//! to `record`, which itself does nothing by default. A narrator can
//! therefore override individual callbacks, or just `record` to see
//! everything as events.

use crate::actions::Action;
use crate::battle::state::RemovalReason;
use crate::buffs::Buff;
use crate::combatant::{Combatant, CombatantRef};
use parking_lot::Mutex;
use schema::Vital;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    TurnStarted {
        turn: u32,
        fighter: String,
        regenerated_mana: u32,
    },
    ActionPrepared {
        fighter: String,
        action: String,
        targets: Vec<String>,
    },
    ActionUsed {
        fighter: String,
        action: String,
    },
    ActionFailed {
        fighter: String,
        action: String,
    },
    DamageDealt {
        target: String,
        stat: Vital,
        amount: u32,
    },
    Recovered {
        target: String,
        stat: Vital,
        requested: u32,
        actual: u32,
    },
    StatUpdated {
        combatant: String,
        stat: Vital,
        current: i32,
        max: i32,
    },
    BuffActivated {
        owner: String,
        buff: Buff,
    },
    BuffApplied {
        owner: String,
        buff: Buff,
        change: i32,
    },
    BuffDeactivated {
        owner: String,
        buff: Buff,
    },
    FighterRemoved {
        fighter: String,
        team_id: usize,
        reason: RemovalReason,
    },
    Victory {
        winners: Vec<String>,
    },
}

impl BattleEvent {
    /// Human-readable text for the event, `None` for events that only
    /// matter to a UI (stat bars, action preparation).
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::TurnStarted {
                turn,
                fighter,
                regenerated_mana,
            } => {
                let mut text = format!("=== Turn {}: {} ===", turn, fighter);
                if *regenerated_mana > 0 {
                    text.push_str(&format!(" (+{} MP)", regenerated_mana));
                }
                Some(text)
            }
            BattleEvent::ActionPrepared { .. } => None,
            BattleEvent::ActionUsed { fighter, action } => {
                Some(format!("{} used {}!", fighter, action))
            }
            BattleEvent::ActionFailed { fighter, action } => {
                Some(format!("{} tried to use {}, but it failed!", fighter, action))
            }
            BattleEvent::DamageDealt {
                target,
                stat,
                amount,
            } => Some(format!(
                "{} lost {} {}!",
                target,
                amount,
                stat.to_string().to_uppercase()
            )),
            BattleEvent::Recovered {
                target,
                stat,
                actual,
                ..
            } => Some(format!(
                "{} recovered {} {}!",
                target,
                actual,
                stat.to_string().to_uppercase()
            )),
            BattleEvent::StatUpdated { .. } => None,
            BattleEvent::BuffActivated { owner, buff } => {
                Some(format!("{} is affected by {}.", owner, buff))
            }
            BattleEvent::BuffApplied {
                owner,
                buff,
                change,
            } => {
                let verb = if *change >= 0 { "gained" } else { "lost" };
                Some(format!(
                    "{} {} {} {} from {}.",
                    owner,
                    verb,
                    change.unsigned_abs(),
                    buff.stat().to_string().to_uppercase(),
                    buff.source
                ))
            }
            BattleEvent::BuffDeactivated { owner, buff } => {
                Some(format!("{} wore off for {}.", buff.source, owner))
            }
            BattleEvent::FighterRemoved {
                fighter, reason, ..
            } => match reason {
                RemovalReason::Defeated => Some(format!("{} was defeated!", fighter)),
                RemovalReason::Fled => Some(format!("{} fled from battle!", fighter)),
            },
            BattleEvent::Victory { winners } => {
                if winners.is_empty() {
                    Some("Nobody is left standing.".to_string())
                } else {
                    Some(format!("{} won the battle!", winners.join(", ")))
                }
            }
        }
    }
}

fn names(fighters: &[CombatantRef]) -> Vec<String> {
    fighters.iter().map(|c| c.name().to_string()).collect()
}

fn origin_name(action: &Action) -> String {
    action
        .origin()
        .map(|origin| origin.name().to_string())
        .unwrap_or_default()
}

/// Receives narration from a `BattleRunner`. Calls arrive in state order
/// from the runner's thread.
pub trait Narrator: Send {
    /// Catch-all sink used by every default callback.
    fn record(&mut self, _event: BattleEvent) {}

    fn turn_started(&mut self, fighter: &Combatant, turn: u32, regenerated_mana: u32) {
        self.record(BattleEvent::TurnStarted {
            turn,
            fighter: fighter.name().to_string(),
            regenerated_mana,
        });
    }

    fn action_prepared(&mut self, action: &Action) {
        self.record(BattleEvent::ActionPrepared {
            fighter: origin_name(action),
            action: action.name().to_string(),
            targets: names(action.targets()),
        });
    }

    fn action_used(&mut self, action: &Action) {
        self.record(BattleEvent::ActionUsed {
            fighter: origin_name(action),
            action: action.name().to_string(),
        });
    }

    fn action_failed(&mut self, action: &Action) {
        self.record(BattleEvent::ActionFailed {
            fighter: origin_name(action),
            action: action.name().to_string(),
        });
    }

    fn damage_dealt(&mut self, target: &Combatant, stat: Vital, amount: u32) {
        self.record(BattleEvent::DamageDealt {
            target: target.name().to_string(),
            stat,
            amount,
        });
    }

    fn recovered(&mut self, target: &Combatant, stat: Vital, requested: u32, actual: u32) {
        self.record(BattleEvent::Recovered {
            target: target.name().to_string(),
            stat,
            requested,
            actual,
        });
    }

    fn stat_updated(&mut self, combatant: &Combatant, stat: Vital) {
        let (current, max) = combatant.read_vital(stat);
        self.record(BattleEvent::StatUpdated {
            combatant: combatant.name().to_string(),
            stat,
            current,
            max,
        });
    }

    fn buff_activated(&mut self, owner: &Combatant, buff: &Buff) {
        self.record(BattleEvent::BuffActivated {
            owner: owner.name().to_string(),
            buff: buff.clone(),
        });
    }

    fn buff_applied(&mut self, owner: &Combatant, buff: &Buff, change: i32) {
        self.record(BattleEvent::BuffApplied {
            owner: owner.name().to_string(),
            buff: buff.clone(),
            change,
        });
    }

    fn buff_deactivated(&mut self, owner: &Combatant, buff: &Buff) {
        self.record(BattleEvent::BuffDeactivated {
            owner: owner.name().to_string(),
            buff: buff.clone(),
        });
    }

    fn fighter_removed(&mut self, fighter: &Combatant, team_id: usize, reason: RemovalReason) {
        self.record(BattleEvent::FighterRemoved {
            fighter: fighter.name().to_string(),
            team_id,
            reason,
        });
    }

    fn victory(&mut self, winners: &[CombatantRef]) {
        self.record(BattleEvent::Victory {
            winners: names(winners),
        });
    }
}

/// Narrates nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {}

/// Narration through a lock, so the caller can keep reading what a runner
/// on another thread records.
impl<N: Narrator> Narrator for Arc<Mutex<N>> {
    fn record(&mut self, event: BattleEvent) {
        self.lock().record(event);
    }
}

/// Records every event.
///
/// # Example
/// ```
/// use jrpg_battle::battle::narration::{EventLog, Narrator, BattleEvent};
///
/// let mut log = EventLog::new();
/// log.record(BattleEvent::Victory { winners: vec!["Aria".to_string()] });
/// assert_eq!(log.formatted(), vec!["Aria won the battle!".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that can be handed to a runner and read from elsewhere.
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Text of every event that has any.
    pub fn formatted(&self) -> Vec<String> {
        self.events.iter().filter_map(BattleEvent::format).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

impl Narrator for EventLog {
    fn record(&mut self, event: BattleEvent) {
        self.events.push(event);
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.formatted() {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}
