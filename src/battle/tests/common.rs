use crate::actions::Action;
use crate::battle::ai::RandomAi;
use crate::battle::control::BattleControl;
use crate::battle::engine::Battle;
use crate::battle::selection::ActionSelector;
use crate::battle::state::BattleState;
use crate::combatant::{Combatant, CombatantRef};
use crate::config::BattleConfig;
use schema::{AttributeGrowth, CombatantTemplate, StatGrowth};
use std::sync::Arc;

/// A builder for creating test combatants with flat stats (no per-level gain).
///
/// # Example
/// ```ignore
/// let brute = TestCombatantBuilder::new("Brute")
///     .strength(10)
///     .hp(50)
///     .with_moves(vec![Action::attack(1, "Strike", 3)])
///     .build_ref();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    level: u32,
    attributes: AttributeGrowth,
    hp: StatGrowth,
    mp: StatGrowth,
    moves: Vec<Action>,
    controller: Option<Arc<dyn ActionSelector>>,
}

impl TestCombatantBuilder {
    /// Level 1, every attribute 1, 20 HP and 10 MP.
    pub fn new(name: &str) -> Self {
        let one = StatGrowth::new(1, 0);
        Self {
            name: name.to_string(),
            level: 1,
            attributes: AttributeGrowth {
                strength: one,
                defense: one,
                agility: one,
                intellect: one,
                spirit: one,
                luck: one,
            },
            hp: StatGrowth::new(20, 0),
            mp: StatGrowth::new(10, 0),
            moves: Vec::new(),
            controller: None,
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn strength(mut self, value: i32) -> Self {
        self.attributes.strength.base = value;
        self
    }

    pub fn defense(mut self, value: i32) -> Self {
        self.attributes.defense.base = value;
        self
    }

    pub fn agility(mut self, value: i32) -> Self {
        self.attributes.agility.base = value;
        self
    }

    pub fn intellect(mut self, value: i32) -> Self {
        self.attributes.intellect.base = value;
        self
    }

    pub fn spirit(mut self, value: i32) -> Self {
        self.attributes.spirit.base = value;
        self
    }

    pub fn hp(mut self, value: i32) -> Self {
        self.hp.base = value;
        self
    }

    pub fn hp_gain(mut self, value: i32) -> Self {
        self.hp.gain = value;
        self
    }

    pub fn mp(mut self, value: i32) -> Self {
        self.mp.base = value;
        self
    }

    pub fn with_moves(mut self, moves: Vec<Action>) -> Self {
        self.moves = moves;
        self
    }

    /// Defaults to `FirstChoice`, which keeps battles deterministic.
    pub fn controller(mut self, controller: Arc<dyn ActionSelector>) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn template(&self) -> CombatantTemplate {
        CombatantTemplate {
            id: 0,
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            hp: self.hp,
            mp: self.mp,
            moves: Vec::new(),
        }
    }

    pub fn build(self) -> Combatant {
        let template = self.template();
        let controller = self.controller.unwrap_or_else(|| Arc::new(FirstChoice));
        match Combatant::from_template(&template, self.level, self.moves, controller) {
            Ok(combatant) => combatant,
            Err(err) => panic!("Failed to build test combatant {}: {}", self.name, err),
        }
    }

    pub fn build_ref(self) -> CombatantRef {
        Arc::new(self.build())
    }
}

/// Always the first move, always the first member of the first other team.
#[derive(Debug, Default)]
pub struct FirstChoice;

impl ActionSelector for FirstChoice {
    fn select_action(
        &self,
        _fighter: &Combatant,
        moves: &[Action],
        _control: &BattleControl,
    ) -> Option<Action> {
        moves.first().map(Action::instantiate)
    }

    fn select_target(
        &self,
        fighter: &Combatant,
        _action: &Action,
        teams: &[Vec<CombatantRef>],
        _control: &BattleControl,
    ) -> Option<CombatantRef> {
        teams
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != fighter.team_id())
            .find_map(|(_, team)| team.first().cloned())
    }
}

/// Plain combatants that only know `guard`, for roster bookkeeping tests.
pub fn fighters(names: &[&str]) -> Vec<CombatantRef> {
    names
        .iter()
        .map(|name| TestCombatantBuilder::new(name).with_moves(vec![guard()]).build_ref())
        .collect()
}

pub fn guard() -> Action {
    Action::defend(100, "Guard", 2.0, 2)
}

pub fn strike(effect: i32) -> Action {
    Action::attack(101, "Strike", effect)
}

/// A fixed seed and a short pause poll so tests stay quick and repeatable.
pub fn seeded_config() -> BattleConfig {
    BattleConfig {
        pause_poll_interval_ms: 5,
        ..BattleConfig::default()
    }
    .with_seed(7)
}

pub fn create_test_battle(teams: Vec<Vec<CombatantRef>>) -> Battle {
    match Battle::new(teams, seeded_config()) {
        Ok(battle) => battle,
        Err(err) => panic!("Failed to create test battle: {}", err),
    }
}

/// Advance until the battle reaches `state`, panicking if it takes
/// unreasonably long.
pub fn advance_until(battle: &mut Battle, state: BattleState) {
    for _ in 0..10_000 {
        if battle.state() == state {
            return;
        }
        battle.advance();
    }
    panic!("battle never reached {:?}, stuck in {:?}", state, battle.state());
}

/// Advance through one full state, returning the state that ran.
pub fn step(battle: &mut Battle) -> BattleState {
    let before = battle.state();
    battle.advance();
    before
}

/// Seeded random AI, shared.
pub fn random_ai(seed: u64) -> Arc<dyn ActionSelector> {
    Arc::new(RandomAi::seeded(seed))
}
