//! A module for defining AI behaviors for battle opponents.

use crate::actions::Action;
use crate::battle::control::BattleControl;
use crate::battle::selection::ActionSelector;
use crate::combatant::{Combatant, CombatantRef};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::debug;

/// Picks uniformly at random: any known move, then any member of any other team.
#[derive(Debug)]
pub struct RandomAi {
    rng: Mutex<StdRng>,
}

impl RandomAi {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// A reproducible AI, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn shared() -> Arc<dyn ActionSelector> {
        Arc::new(Self::new())
    }
}

impl Default for RandomAi {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionSelector for RandomAi {
    fn select_action(
        &self,
        fighter: &Combatant,
        moves: &[Action],
        _control: &BattleControl,
    ) -> Option<Action> {
        // Empty only for combatants no roster would admit.
        let mut rng = self.rng.lock();
        let chosen = moves.choose(&mut *rng)?;
        debug!(fighter = fighter.name(), action = chosen.name(), "AI chose action");
        Some(chosen.instantiate())
    }

    fn select_target(
        &self,
        fighter: &Combatant,
        _action: &Action,
        teams: &[Vec<CombatantRef>],
        _control: &BattleControl,
    ) -> Option<CombatantRef> {
        let own_team = fighter.team_id();
        let other_teams: Vec<&Vec<CombatantRef>> = teams
            .iter()
            .enumerate()
            .filter(|(index, team)| Some(*index) != own_team && !team.is_empty())
            .map(|(_, team)| team)
            .collect();

        let mut rng = self.rng.lock();
        let team = other_teams.choose(&mut *rng)?;
        let target = team.choose(&mut *rng)?;
        debug!(fighter = fighter.name(), target = target.name(), "AI chose target");
        Some(Arc::clone(target))
    }
}
