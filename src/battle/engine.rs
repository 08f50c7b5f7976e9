//! The battle state machine.
//!
//! `Battle::advance` performs the work of exactly one `BattleState` and moves
//! to the next. A battle is driven from one thread at a time; the only
//! cross-thread pieces are the combatants' own stat locks and the
//! `BattleControl` that blocking selectors watch.

use crate::actions::Action;
use crate::battle::control::BattleControl;
use crate::battle::roster::Roster;
use crate::battle::state::{BattleState, Removal, RemovalReason};
use crate::buffs::{Buff, BuffTick};
use crate::combatant::CombatantRef;
use crate::config::BattleConfig;
use crate::errors::BattleSetupError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Battle {
    roster: Roster,
    state: BattleState,
    last_state: BattleState,
    config: BattleConfig,
    rng: StdRng,
    control: BattleControl,
    /// Whoever started the current turn, even if they have since left
    actor: Option<CombatantRef>,
    last_action: Option<Action>,
    removed: Vec<Removal>,
    /// Removed fighters still holding a seat; released at `EndingTurn`
    pending_stop: Vec<CombatantRef>,
    regenerated_mana: u32,
    expired_buffs: Vec<Buff>,
    buff_ticks: Vec<BuffTick>,
    fled: bool,
    turn_number: u32,
    winning_team: Option<Vec<CombatantRef>>,
}

impl Battle {
    /// Register every combatant and set up the turn order. Fails on fewer
    /// than two teams, an empty team, or a combatant already in a battle.
    pub fn new(teams: Vec<Vec<CombatantRef>>, config: BattleConfig) -> Result<Self, BattleSetupError> {
        let roster = Roster::new(teams)?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let control = BattleControl::new(config.pause_poll_interval());

        info!(
            teams = roster.teams().len(),
            fighters = roster.turn_order().len(),
            "battle created"
        );

        Ok(Self {
            roster,
            state: BattleState::StartingTurn,
            last_state: BattleState::StartingTurn,
            config,
            rng,
            control,
            actor: None,
            last_action: None,
            removed: Vec::new(),
            pending_stop: Vec::new(),
            regenerated_mana: 0,
            expired_buffs: Vec::new(),
            buff_ticks: Vec::new(),
            fled: false,
            turn_number: 0,
            winning_team: None,
        })
    }

    /// Do one state's work. Returns whether the battle needs more calls.
    ///
    /// `GettingAction` is the one state that may repeat: when the selection
    /// was canceled no action comes back, the state stays put and the next
    /// call asks again.
    pub fn advance(&mut self) -> bool {
        let state = self.state;
        let next = match state {
            BattleState::StartingTurn => {
                self.start_turn();
                state.next()
            }
            BattleState::GettingAction => {
                if !self.get_action() {
                    return true;
                }
                state.next()
            }
            BattleState::ApplyingAction => {
                self.apply_action();
                state.next()
            }
            BattleState::ApplyingBuffs => {
                self.apply_buffs();
                state.next()
            }
            BattleState::CheckingDeath => {
                self.check_death();
                state.next()
            }
            BattleState::EndingTurn => {
                self.end_turn();
                state.next()
            }
            BattleState::CheckingVictory => self.check_victory(),
            BattleState::Looting => {
                debug!("looting");
                state.next()
            }
            BattleState::Ending => return false,
        };

        debug!(from = %state, to = %next, "battle state advanced");
        self.last_state = state;
        self.state = next;
        !next.is_terminal()
    }

    fn start_turn(&mut self) {
        self.turn_number += 1;
        self.removed.clear();
        self.buff_ticks.clear();
        self.last_action = None;
        self.fled = false;

        let Some(actor) = self.roster.current().cloned() else {
            self.actor = None;
            self.expired_buffs.clear();
            self.regenerated_mana = 0;
            return;
        };

        self.expired_buffs = actor.remove_expired_buffs();
        self.regenerated_mana = actor.regenerate_mana(self.config.mana_regen_rate);
        debug!(
            turn = self.turn_number,
            fighter = actor.name(),
            regenerated_mana = self.regenerated_mana,
            expired = self.expired_buffs.len(),
            "turn started"
        );
        self.actor = Some(actor);
    }

    fn get_action(&mut self) -> bool {
        let Some(actor) = self.actor.clone() else {
            return false;
        };
        actor.empty_expired_buffs();
        self.expired_buffs.clear();

        match actor.next_action(self.roster.teams(), &self.control) {
            Some(action) => {
                debug!(fighter = actor.name(), action = action.name(), "action selected");
                self.last_action = Some(action);
                true
            }
            None => {
                debug!(fighter = actor.name(), "no action selected");
                false
            }
        }
    }

    fn apply_action(&mut self) {
        let Some(action) = self.last_action.as_mut() else {
            return;
        };
        let successful = action.apply(&mut self.rng, &self.config);
        let escaped = if successful && action.is_flee() {
            action.origin().cloned()
        } else {
            None
        };

        if let Some(origin) = escaped {
            self.fled = true;
            self.remove(&origin, RemovalReason::Fled);
        }
    }

    fn apply_buffs(&mut self) {
        if self.fled {
            return;
        }
        if let Some(actor) = &self.actor {
            self.buff_ticks = actor.apply_buffs();
        }
    }

    /// Targets of the last action and the actor itself (periodic drains can
    /// finish it off) leave the battle once their hp reaches zero.
    fn check_death(&mut self) {
        let mut candidates: Vec<CombatantRef> = self
            .last_action
            .as_ref()
            .map(|action| action.targets().to_vec())
            .unwrap_or_default();
        candidates.extend(self.actor.clone());

        for fighter in candidates {
            if fighter.hp() <= 0 && self.roster.contains(&fighter) {
                self.remove(&fighter, RemovalReason::Defeated);
            }
        }
    }

    fn end_turn(&mut self) {
        let touched: Vec<usize> = self.removed.iter().map(|removal| removal.team_id).collect();
        for fighter in self.pending_stop.drain(..) {
            fighter.stop_fighting();
        }
        let removed_teams = self.roster.remove_empty_teams(&touched);
        if !removed_teams.is_empty() {
            info!(teams = ?removed_teams, remaining = self.roster.teams().len(), "teams eliminated");
        }
        debug_assert!(self.roster.is_consistent());
    }

    fn check_victory(&mut self) -> BattleState {
        if self.roster.teams().len() <= 1 {
            self.winning_team = self.roster.teams().first().cloned();
            let winners: Vec<&str> = self
                .winning_team
                .iter()
                .flatten()
                .map(|c| c.name())
                .collect();
            info!(turns = self.turn_number, ?winners, "battle decided");
            BattleState::Looting
        } else {
            self.roster.advance_turn();
            BattleState::StartingTurn
        }
    }

    fn remove(&mut self, fighter: &CombatantRef, reason: RemovalReason) {
        if let Some(team_id) = self.roster.remove_fighter(fighter) {
            info!(fighter = fighter.name(), team_id, ?reason, "fighter left the battle");
            self.removed.push(Removal {
                fighter: fighter.clone(),
                team_id,
                reason,
            });
            self.pending_stop.push(fighter.clone());
        }
    }

    // === Accessors ===

    pub fn state(&self) -> BattleState {
        self.state
    }

    /// The state whose work the last successful `advance` performed.
    pub fn last_state(&self) -> BattleState {
        self.last_state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn control(&self) -> &BattleControl {
        &self.control
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn teams(&self) -> &[Vec<CombatantRef>] {
        self.roster.teams()
    }

    pub fn turn_order(&self) -> &[CombatantRef] {
        self.roster.turn_order()
    }

    pub fn current_fighter(&self) -> usize {
        self.roster.current_fighter()
    }

    pub fn current_combatant(&self) -> Option<&CombatantRef> {
        self.roster.current()
    }

    /// Who is acting this turn; stays set after they flee or fall.
    pub fn actor(&self) -> Option<&CombatantRef> {
        self.actor.as_ref()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.last_action.as_ref()
    }

    /// Fighters removed since the turn started, for narration.
    pub fn removed_fighters(&self) -> &[Removal] {
        &self.removed
    }

    pub fn regenerated_mana(&self) -> u32 {
        self.regenerated_mana
    }

    /// Buffs that ran out at the start of this turn.
    pub fn expired_buffs(&self) -> &[Buff] {
        &self.expired_buffs
    }

    pub fn buff_ticks(&self) -> &[BuffTick] {
        &self.buff_ticks
    }

    pub fn fled(&self) -> bool {
        self.fled
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Surviving team once the battle is decided; `None` until then, or if
    /// the last two teams fell together.
    pub fn winning_team(&self) -> Option<&[CombatantRef]> {
        self.winning_team.as_deref()
    }
}

/// Fighters removed mid-turn are released here if the battle is dropped
/// before `EndingTurn`; everyone still seated goes with the roster.
impl Drop for Battle {
    fn drop(&mut self) {
        for fighter in self.pending_stop.drain(..) {
            fighter.stop_fighting();
        }
    }
}
