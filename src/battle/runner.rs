//! Driving a battle to completion with narration, pause and cancel.

use crate::actions::Effect;
use crate::battle::control::{BattleControl, Canceled};
use crate::battle::engine::Battle;
use crate::battle::narration::{Narrator, SilentNarrator};
use crate::battle::state::BattleState;
use crate::buffs::BuffTick;
use crossbeam_channel::Sender;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The battle reached `Ending`
    Completed,
    /// Canceled at a checkpoint; the battle is left consistent but unfinished
    Canceled,
}

/// Sent to the owner of a displayed battle that ran to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleEnded {
    pub turns: u32,
    /// Names of the surviving team; empty after a draw
    pub winners: Vec<String>,
}

impl BattleEnded {
    fn from_battle(battle: &Battle) -> Self {
        Self {
            turns: battle.turn_number(),
            winners: battle
                .winning_team()
                .unwrap_or_default()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        }
    }
}

/// Owns a battle and advances it until it ends or is canceled, narrating
/// each completed state. Pause and cancel are honored between narration
/// calls and before every `advance`.
pub struct BattleRunner {
    battle: Battle,
    narrator: Box<dyn Narrator>,
    control: BattleControl,
}

impl BattleRunner {
    pub fn new(battle: Battle) -> Self {
        let control = battle.control().clone();
        Self {
            battle,
            narrator: Box::new(SilentNarrator),
            control,
        }
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Box::new(narrator);
        self
    }

    /// A handle on this run's pause and cancel signals.
    pub fn control(&self) -> BattleControl {
        self.control.clone()
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn into_battle(self) -> Battle {
        self.battle
    }

    /// Drive the battle on the current thread.
    pub fn run(&mut self) -> RunOutcome {
        match self.drive() {
            Ok(()) => {
                info!(turns = self.battle.turn_number(), "battle run completed");
                RunOutcome::Completed
            }
            Err(Canceled) => {
                info!(state = %self.battle.state(), "battle run canceled");
                RunOutcome::Canceled
            }
        }
    }

    fn drive(&mut self) -> Result<(), Canceled> {
        loop {
            self.control.checkpoint()?;
            let before = self.battle.state();
            let more = self.battle.advance();
            if self.battle.state() != before {
                self.narrate(before)?;
            }
            if !more {
                return Ok(());
            }
        }
    }

    /// Narrate the work `completed` just did. Every call is a checkpoint.
    fn narrate(&mut self, completed: BattleState) -> Result<(), Canceled> {
        let battle = &self.battle;
        let narrator = &mut self.narrator;
        let control = &self.control;

        match completed {
            BattleState::StartingTurn => {
                let Some(actor) = battle.actor() else {
                    return Ok(());
                };
                for buff in battle.expired_buffs() {
                    control.checkpoint()?;
                    narrator.buff_deactivated(actor, buff);
                }
                control.checkpoint()?;
                narrator.turn_started(actor, battle.turn_number(), battle.regenerated_mana());
                if battle.regenerated_mana() > 0 {
                    control.checkpoint()?;
                    narrator.stat_updated(actor, schema::Vital::Mp);
                }
            }
            BattleState::GettingAction => {
                if let Some(action) = battle.last_action() {
                    control.checkpoint()?;
                    narrator.action_prepared(action);
                }
            }
            BattleState::ApplyingAction => {
                let Some(action) = battle.last_action() else {
                    return Ok(());
                };
                control.checkpoint()?;
                if !action.was_successful() {
                    narrator.action_failed(action);
                    return Ok(());
                }
                narrator.action_used(action);

                if let (Some(origin), Some(cost_stat)) = (action.origin(), action.cost_stat()) {
                    if action.cost_amount() > 0 {
                        control.checkpoint()?;
                        narrator.stat_updated(origin, cost_stat);
                    }
                }
                for (target, effect) in action.targets().iter().zip(action.effects()) {
                    match *effect {
                        Effect::Damage { stat, amount } => {
                            control.checkpoint()?;
                            narrator.damage_dealt(target, stat, amount);
                            control.checkpoint()?;
                            narrator.stat_updated(target, stat);
                        }
                        Effect::Recovery {
                            stat,
                            requested,
                            actual,
                        } => {
                            control.checkpoint()?;
                            narrator.recovered(target, stat, requested, actual);
                            control.checkpoint()?;
                            narrator.stat_updated(target, stat);
                        }
                        Effect::Unaffected => {}
                    }
                }
            }
            BattleState::ApplyingBuffs => {
                let Some(actor) = battle.actor() else {
                    return Ok(());
                };
                for tick in battle.buff_ticks() {
                    control.checkpoint()?;
                    match tick {
                        BuffTick::Activated { buff } => narrator.buff_activated(actor, buff),
                        BuffTick::Applied { buff, change } => {
                            narrator.buff_applied(actor, buff, *change);
                            if let Some(vital) = buff.stat().as_vital() {
                                control.checkpoint()?;
                                narrator.stat_updated(actor, vital);
                            }
                        }
                    }
                }
            }
            BattleState::CheckingDeath => {
                for removal in battle.removed_fighters() {
                    control.checkpoint()?;
                    narrator.fighter_removed(&removal.fighter, removal.team_id, removal.reason);
                }
            }
            BattleState::CheckingVictory => {
                if battle.state() == BattleState::Looting {
                    control.checkpoint()?;
                    narrator.victory(battle.winning_team().unwrap_or_default());
                }
            }
            BattleState::EndingTurn | BattleState::Looting | BattleState::Ending => {}
        }
        Ok(())
    }

    /// Run on a new thread as the displayed battle. `on_end` runs once,
    /// on the battle thread, if the battle completes without being
    /// canceled. Use `spawn_displayed_to` to hear about it on another thread.
    pub fn spawn_displayed<F>(self, on_end: F) -> io::Result<BattleHandle>
    where
        F: FnOnce(&Battle) + Send + 'static,
    {
        self.spawn("battle-displayed", Some(Box::new(on_end)))
    }

    /// Run on a new thread as the displayed battle, posting a `BattleEnded`
    /// to `ended` once it completes so the owner handles it on its own
    /// thread. Nothing is sent for a canceled run.
    pub fn spawn_displayed_to(self, ended: Sender<BattleEnded>) -> io::Result<BattleHandle> {
        self.spawn_displayed(move |battle| {
            if ended.send(BattleEnded::from_battle(battle)).is_err() {
                debug!("battle owner stopped listening");
            }
        })
    }

    /// Run on a new thread with no completion callback.
    pub fn spawn_background(self) -> io::Result<BattleHandle> {
        self.spawn("battle-background", None)
    }

    fn spawn(
        mut self,
        name: &str,
        on_end: Option<Box<dyn FnOnce(&Battle) + Send>>,
    ) -> io::Result<BattleHandle> {
        let control = self.control();
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);

        let thread = thread::Builder::new().name(name.to_string()).spawn(move || {
            let outcome = self.run();
            if outcome == RunOutcome::Completed {
                if let Some(on_end) = on_end {
                    debug!("battle ended, notifying owner");
                    on_end(&self.battle);
                }
            }
            done.store(true, Ordering::SeqCst);
            (outcome, self.battle)
        })?;

        Ok(BattleHandle {
            control,
            finished,
            thread,
        })
    }
}

/// Control over a battle running on its own thread.
#[derive(Debug)]
pub struct BattleHandle {
    control: BattleControl,
    finished: Arc<AtomicBool>,
    thread: JoinHandle<(RunOutcome, Battle)>,
}

impl BattleHandle {
    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Ask the run to stop at its next checkpoint. Also wakes a human
    /// selection that is waiting for input.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn control(&self) -> &BattleControl {
        &self.control
    }

    /// Wait for the run to end and take the battle back.
    pub fn join(self) -> thread::Result<(RunOutcome, Battle)> {
        self.thread.join()
    }
}
