//! Team and turn-order bookkeeping, including the renumbering that keeps
//! fighter and team ids dense as combatants leave.

use crate::combatant::CombatantRef;
use crate::errors::BattleSetupError;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Roster {
    teams: Vec<Vec<CombatantRef>>,
    turn_order: Vec<CombatantRef>,
    current_fighter: usize,
}

impl Roster {
    /// Register every combatant and build the turn order: teams flattened in
    /// order. At least two teams, none of them empty, and every fighter
    /// must know at least one move.
    pub fn new(teams: Vec<Vec<CombatantRef>>) -> Result<Self, BattleSetupError> {
        if teams.len() < 2 {
            return Err(BattleSetupError::TooFewTeams(teams.len()));
        }
        if let Some(empty) = teams.iter().position(|team| team.is_empty()) {
            return Err(BattleSetupError::EmptyTeam(empty));
        }
        if let Some(idle) = teams.iter().flatten().find(|fighter| fighter.moves().is_empty()) {
            return Err(BattleSetupError::NoMoves(idle.name().to_string()));
        }

        let mut registered: Vec<&CombatantRef> = Vec::new();
        for (team_id, team) in teams.iter().enumerate() {
            for (fighter_id, fighter) in team.iter().enumerate() {
                if let Err(err) = fighter.start_fighting(fighter_id, team_id) {
                    for done in registered {
                        done.stop_fighting();
                    }
                    return Err(err);
                }
                registered.push(fighter);
            }
        }

        let turn_order = teams.iter().flatten().cloned().collect();
        Ok(Self {
            teams,
            turn_order,
            current_fighter: 0,
        })
    }

    pub fn teams(&self) -> &[Vec<CombatantRef>] {
        &self.teams
    }

    pub fn turn_order(&self) -> &[CombatantRef] {
        &self.turn_order
    }

    pub fn current_fighter(&self) -> usize {
        self.current_fighter
    }

    pub fn current(&self) -> Option<&CombatantRef> {
        self.turn_order.get(self.current_fighter)
    }

    pub fn contains(&self, fighter: &CombatantRef) -> bool {
        self.position_of(fighter).is_some()
    }

    fn position_of(&self, fighter: &CombatantRef) -> Option<usize> {
        self.turn_order
            .iter()
            .position(|other| Arc::ptr_eq(other, fighter))
    }

    /// Move to the next fighter in turn order, wrapping around.
    pub fn advance_turn(&mut self) {
        if !self.turn_order.is_empty() {
            self.current_fighter = (self.current_fighter + 1) % self.turn_order.len();
        }
    }

    /// Take a fighter out of the turn order and its team.
    ///
    /// If it sat at or before the current position, the cursor steps back one
    /// (wrapping) so the next `advance_turn` lands on the same fighter it
    /// would have before. Teammates behind it move up one fighter id.
    /// Returns the team the fighter was on, or `None` if it was not here.
    pub fn remove_fighter(&mut self, fighter: &CombatantRef) -> Option<usize> {
        let position = self.position_of(fighter)?;
        self.turn_order.remove(position);
        if position <= self.current_fighter {
            self.current_fighter = match self.current_fighter.checked_sub(1) {
                Some(previous) => previous,
                None => self.turn_order.len().saturating_sub(1),
            };
        }

        let team_id = fighter.team_id()?;
        let team = self.teams.get_mut(team_id)?;
        let index = fighter
            .fighter_id()
            .filter(|&id| team.get(id).is_some_and(|member| Arc::ptr_eq(member, fighter)))
            .or_else(|| team.iter().position(|member| Arc::ptr_eq(member, fighter)))?;
        team.remove(index);
        for (fighter_id, member) in team.iter().enumerate().skip(index) {
            member.set_fighter_id(fighter_id);
        }

        debug!(
            fighter = fighter.name(),
            team_id,
            remaining = self.turn_order.len(),
            "fighter removed from roster"
        );
        Some(team_id)
    }

    /// Drop a team and shift the ids of every team after it down by one.
    pub fn remove_team(&mut self, team_id: usize) {
        if team_id >= self.teams.len() {
            return;
        }
        self.teams.remove(team_id);
        for (new_id, team) in self.teams.iter().enumerate().skip(team_id) {
            for member in team {
                member.set_team_id(new_id);
            }
        }
        debug!(team_id, remaining = self.teams.len(), "team removed");
    }

    /// Remove whichever of `candidates` have no members left. Returns the
    /// removed team ids, highest first.
    pub fn remove_empty_teams(&mut self, candidates: &[usize]) -> Vec<usize> {
        let mut candidates = candidates.to_vec();
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        candidates.dedup();

        let mut removed = Vec::new();
        for team_id in candidates {
            if self.teams.get(team_id).is_some_and(|team| team.is_empty()) {
                self.remove_team(team_id);
                removed.push(team_id);
            }
        }
        removed
    }

    /// Turn order matches the teams and every id is dense.
    pub fn is_consistent(&self) -> bool {
        let total: usize = self.teams.iter().map(Vec::len).sum();
        if total != self.turn_order.len() {
            return false;
        }
        if !self.turn_order.is_empty() && self.current_fighter >= self.turn_order.len() {
            return false;
        }
        self.teams.iter().enumerate().all(|(team_id, team)| {
            team.iter().enumerate().all(|(fighter_id, member)| {
                member.team_id() == Some(team_id) && member.fighter_id() == Some(fighter_id)
            })
        })
    }
}

impl Drop for Roster {
    fn drop(&mut self) {
        for fighter in &self.turn_order {
            fighter.stop_fighting();
        }
    }
}
