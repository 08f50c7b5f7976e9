//! The three-phase pipeline every action runs through: cost, effect, buffs.

use super::{Action, ActionKind, Effect, SkillEffect};
use crate::config::BattleConfig;
use crate::combatant::Combatant;
use rand::Rng;
use schema::Vital;
use tracing::debug;

/// `origin_level / sum_of_opponent_levels + agility_weight * origin_agility`.
/// With no opponents the origin is unopposed and escapes outright.
pub fn escape_advantage(
    origin_level: u32,
    opponent_levels: u32,
    origin_agility: i32,
    agility_weight: f64,
) -> f64 {
    if opponent_levels == 0 {
        return f64::INFINITY;
    }
    origin_level as f64 / opponent_levels as f64 + agility_weight * origin_agility as f64
}

/// Escape roll. The thresholds are kept exactly as the game has always used
/// them, including the exact-equality coin flip at 1.0: above 1 always
/// escapes, below 0.1 never does, anything else escapes iff `roll <= advantage`.
pub fn escape_succeeds<R: Rng + ?Sized>(advantage: f64, rng: &mut R) -> bool {
    if advantage == 1.0 {
        rng.random_bool(0.5)
    } else if advantage > 1.0 {
        true
    } else if advantage < 0.1 {
        false
    } else {
        rng.random::<f64>() <= advantage
    }
}

/// `round(effect + power / resistance)`, never negative. Resistance is floored
/// at 1 so a zeroed defense cannot divide by zero.
fn scaled_damage(effect: i32, power: i32, resistance: i32) -> u32 {
    let raw = effect as f64 + power as f64 / resistance.max(1) as f64;
    raw.round().max(0.0) as u32
}

fn deal_damage(target: &Combatant, amount: u32) -> Effect {
    target.vital(Vital::Hp).lose(amount);
    Effect::Damage {
        stat: Vital::Hp,
        amount,
    }
}

fn recover(target: &Combatant, vital: Vital, amount: u32) -> Effect {
    let stat = target.vital(vital);
    let before = stat.current();
    stat.gain(amount, target.level());
    Effect::Recovery {
        stat: vital,
        requested: amount,
        actual: (stat.current() - before).max(0) as u32,
    }
}

impl Action {
    /// Run the action once: cost, then effect and buffs if the cost was paid.
    /// Returns whether the cost phase succeeded.
    pub fn apply<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &BattleConfig) -> bool {
        self.effects.clear();
        self.successful = self.apply_cost(rng, config);
        if self.successful {
            self.apply_effect(rng, config);
            self.apply_buffs();
        }
        debug!(action = %self.name, successful = self.successful, "action applied");
        self.successful
    }

    /// Skip the cost phase and treat the action as successful.
    pub fn apply_forced<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &BattleConfig) {
        self.effects.clear();
        self.successful = true;
        self.apply_effect(rng, config);
        self.apply_buffs();
    }

    /// Pay for the action. Mana-costed kinds fail without touching anything
    /// when the origin cannot afford them; flee rolls its escape here.
    pub fn apply_cost<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &BattleConfig) -> bool {
        let Some(origin) = self.origin.clone() else {
            return false;
        };

        match &self.kind {
            ActionKind::Flee { opponents } => {
                let opponent_levels = opponents.iter().map(|c| c.level()).sum();
                let advantage = escape_advantage(
                    origin.level(),
                    opponent_levels,
                    origin.agility(),
                    config.flee_agility_weight,
                );
                let escaped = escape_succeeds(advantage, rng);
                debug!(fighter = origin.name(), advantage, escaped, "flee attempt");
                escaped
            }
            ActionKind::Attack | ActionKind::Defend | ActionKind::UseItem { .. } => true,
            ActionKind::Skill(_) => match self.cost_stat {
                Some(vital) => {
                    let stat = origin.vital(vital);
                    if stat.current() < self.cost_amount as i32 {
                        false
                    } else {
                        stat.lose(self.cost_amount);
                        true
                    }
                }
                None => true,
            },
        }
    }

    pub fn apply_effect<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &BattleConfig) {
        let Some(origin) = self.origin.clone() else {
            return;
        };

        match &self.kind {
            ActionKind::Attack => {
                if let Some(target) = self.targets.first() {
                    let amount =
                        scaled_damage(self.effect_amount, origin.strength(), target.defense());
                    self.effects.push(deal_damage(target, amount));
                }
            }
            ActionKind::Skill(SkillEffect::Damage) => {
                for target in &self.targets {
                    let amount =
                        scaled_damage(self.effect_amount, origin.intellect(), target.spirit());
                    self.effects.push(deal_damage(target, amount));
                }
            }
            ActionKind::Skill(SkillEffect::Restore) => {
                let amount = self.effect_amount.max(0) as u32;
                for target in &self.targets {
                    self.effects.push(recover(target, self.effect_stat, amount));
                }
            }
            ActionKind::Skill(SkillEffect::Enchant) => {
                self.effects = vec![Effect::Unaffected; self.targets.len()];
            }
            ActionKind::UseItem { item } => {
                let mut inner = item.instantiate();
                inner.set_origin(origin);
                inner.set_targets(self.targets.iter().take(1).cloned().collect());
                inner.apply_forced(rng, config);
                self.effects = inner.effects;
            }
            ActionKind::Defend | ActionKind::Flee { .. } => {}
        }
    }

    pub fn apply_buffs(&mut self) {
        if let (Some(buff), Some(origin)) = (&self.origin_buff, &self.origin) {
            origin.add_buff(buff.clone());
        }
        if let Some(buff) = &self.target_buff {
            for target in &self.targets {
                target.add_buff(buff.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::TestCombatantBuilder;
    use crate::buffs::BuffKind;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;
    use schema::StatKind;
    use std::sync::Arc;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[rstest]
    #[case(10, 1, 0, 10.0)]
    #[case(5, 10, 0, 0.5)]
    #[case(5, 10, 2, 0.9)]
    fn test_escape_advantage(
        #[case] level: u32,
        #[case] opponents: u32,
        #[case] agility: i32,
        #[case] expected: f64,
    ) {
        let advantage = escape_advantage(level, opponents, agility, 0.2);
        assert!((advantage - expected).abs() < 1e-9);
    }

    #[test]
    fn test_escape_thresholds() {
        let mut rng = rng();
        for _ in 0..50 {
            assert!(escape_succeeds(1.5, &mut rng));
            assert!(!escape_succeeds(0.05, &mut rng));
        }
        assert!(escape_succeeds(f64::INFINITY, &mut rng));
    }

    #[test]
    fn test_attack_damage_formula() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").strength(10).build());
        let target = Arc::new(TestCombatantBuilder::new("Bram").defense(5).hp(50).build());

        let mut strike = Action::attack(1, "Strike", 3);
        strike.set_origin(origin);
        strike.set_targets(vec![target.clone()]);

        assert!(strike.apply(&mut rng(), &BattleConfig::default()));
        assert_eq!(
            strike.effects(),
            &[Effect::Damage {
                stat: Vital::Hp,
                amount: 5
            }]
        );
        assert_eq!(target.hp(), 45);
    }

    #[test]
    fn test_attack_damage_clamps_hp_at_zero() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").strength(100).build());
        let target = Arc::new(TestCombatantBuilder::new("Bram").defense(1).hp(20).build());

        let mut strike = Action::attack(1, "Strike", 0);
        strike.set_origin(origin);
        strike.set_targets(vec![target.clone()]);
        strike.apply(&mut rng(), &BattleConfig::default());

        assert_eq!(target.hp(), 0);
        assert!(!target.is_alive());
    }

    #[test]
    fn test_skill_without_mana_fails_cleanly() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").mp(40).build());
        origin.set_mp(5);
        let target = Arc::new(TestCombatantBuilder::new("Bram").hp(50).build());
        target.start_fighting(0, 1).unwrap();

        let mut hex = Action::enchant(2, "Hex", 20, StatKind::Defense, 0.5, 2);
        hex.set_origin(origin.clone());
        hex.set_targets(vec![target.clone()]);

        assert!(!hex.apply(&mut rng(), &BattleConfig::default()));
        assert!(!hex.was_successful());
        assert_eq!(origin.mp(), 5);
        assert!(hex.effects().is_empty());
        assert!(target.active_buffs().is_empty());
    }

    #[test]
    fn test_spell_spends_mana_and_uses_intellect() {
        let origin = Arc::new(
            TestCombatantBuilder::new("Aria")
                .intellect(12)
                .mp(30)
                .build(),
        );
        let target = Arc::new(TestCombatantBuilder::new("Bram").spirit(4).hp(50).build());

        let mut bolt = Action::spell(3, "Bolt", 10, 7);
        bolt.set_origin(origin.clone());
        bolt.set_targets(vec![target.clone()]);

        assert!(bolt.apply(&mut rng(), &BattleConfig::default()));
        assert_eq!(origin.mp(), 20);
        assert_eq!(target.hp(), 40);
    }

    #[test]
    fn test_heal_reports_actual_recovery() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").mp(30).build());
        let target = Arc::new(TestCombatantBuilder::new("Bram").hp(50).build());
        target.set_hp(40);

        let mut mend = Action::heal(4, "Mend", 5, 25, Vital::Hp);
        mend.set_origin(origin);
        mend.set_targets(vec![target.clone()]);
        mend.apply(&mut rng(), &BattleConfig::default());

        assert_eq!(
            mend.effects(),
            &[Effect::Recovery {
                stat: Vital::Hp,
                requested: 25,
                actual: 10
            }]
        );
        assert_eq!(target.hp(), 50);
    }

    #[test]
    fn test_defend_buffs_origin() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").build());
        origin.start_fighting(0, 0).unwrap();

        let mut guard = Action::defend(5, "Guard", 2.0, 2);
        guard.set_origin(origin.clone());
        assert!(guard.apply(&mut rng(), &BattleConfig::default()));

        let buffs = origin.active_buffs();
        assert_eq!(buffs.len(), 1);
        assert_eq!(
            buffs[0].kind,
            BuffKind::Modifier {
                stat: StatKind::Defense,
                multiplier: 2.0
            }
        );
    }

    #[test]
    fn test_item_forwards_to_bound_action_for_free() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").mp(10).build());
        origin.set_mp(0);
        let ally = Arc::new(TestCombatantBuilder::new("Bram").hp(60).build());
        ally.set_hp(10);
        let bystander = Arc::new(TestCombatantBuilder::new("Cora").hp(60).build());
        bystander.set_hp(10);

        let potion_effect = Action::heal(10, "Potion Effect", 50, 30, Vital::Hp);
        let mut potion = Action::use_item(11, "Potion", potion_effect);
        potion.set_origin(origin.clone());
        potion.set_targets(vec![ally.clone(), bystander.clone()]);

        assert!(potion.apply(&mut rng(), &BattleConfig::default()));
        assert_eq!(origin.mp(), 0, "item use bypasses the bound action's cost");
        assert_eq!(ally.hp(), 40);
        assert_eq!(bystander.hp(), 10, "only the first chosen target is affected");
        assert_eq!(potion.effects().len(), 1);
    }

    #[test]
    fn test_guaranteed_flee() {
        let origin = Arc::new(TestCombatantBuilder::new("Aria").level(10).build());
        let opponent = Arc::new(TestCombatantBuilder::new("Bram").level(1).build());

        let mut run = Action::flee(6, "Run");
        run.set_origin(origin);
        run.set_opponents(vec![opponent]);

        for _ in 0..20 {
            assert!(run.instantiate().apply(&mut rng(), &BattleConfig::default()));
        }
    }
}
