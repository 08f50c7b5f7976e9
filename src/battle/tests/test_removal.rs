#[cfg(test)]
mod tests {
    use crate::battle::state::{BattleState, RemovalReason};
    use crate::battle::tests::common::{
        advance_until, create_test_battle, guard, random_ai, seeded_config, strike,
        TestCombatantBuilder,
    };
    use crate::battle::engine::Battle;
    use crate::combatant::CombatantRef;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::Arc;

    /// A and B on one side, C on the other. C one-shots whoever leads the
    /// other team; A and B only guard.
    fn two_versus_one() -> (Battle, CombatantRef, CombatantRef, CombatantRef) {
        let a = TestCombatantBuilder::new("A")
            .hp(1)
            .with_moves(vec![guard()])
            .build_ref();
        let b = TestCombatantBuilder::new("B")
            .with_moves(vec![guard()])
            .build_ref();
        let c = TestCombatantBuilder::new("C")
            .strength(10)
            .with_moves(vec![strike(100)])
            .build_ref();
        let battle = create_test_battle(vec![vec![a.clone(), b.clone()], vec![c.clone()]]);
        (battle, a, b, c)
    }

    #[test]
    fn test_survivor_is_renumbered_and_cursor_kept() {
        let (mut battle, a, b, c) = two_versus_one();

        // A and B guard, then C's turn.
        for _ in 0..3 {
            advance_until(&mut battle, BattleState::StartingTurn);
            battle.advance();
        }
        assert!(Arc::ptr_eq(battle.actor().unwrap(), &c));
        assert_eq!(battle.current_fighter(), 2);

        advance_until(&mut battle, BattleState::EndingTurn);
        assert_eq!(a.hp(), 0);
        assert_eq!(battle.removed_fighters().len(), 1);
        assert_eq!(battle.removed_fighters()[0].reason, RemovalReason::Defeated);
        assert_eq!(battle.removed_fighters()[0].team_id, 0);

        assert_eq!(battle.turn_order().len(), 2);
        assert_eq!(battle.teams()[0].len(), 1);
        assert_eq!(b.fighter_id(), Some(0));
        // A sat before the cursor, so it moved back with C.
        assert_eq!(battle.current_fighter(), 1);
        assert!(Arc::ptr_eq(battle.current_combatant().unwrap(), &c));
        // Still registered until the turn ends.
        assert_eq!(a.team_id(), Some(0));

        battle.advance();
        assert_eq!(a.fighter_id(), None);
        assert!(!a.is_fighting());

        // The turn after C's belongs to B, as it would have without the removal.
        advance_until(&mut battle, BattleState::GettingAction);
        assert!(Arc::ptr_eq(battle.actor().unwrap(), &b));
    }

    #[test]
    fn test_emptied_middle_team_shifts_later_team_ids() {
        let a = TestCombatantBuilder::new("A")
            .with_moves(vec![strike(100)])
            .build_ref();
        let b = TestCombatantBuilder::new("B").with_moves(vec![guard()]).build_ref();
        let c = TestCombatantBuilder::new("C").with_moves(vec![guard()]).build_ref();
        let d = TestCombatantBuilder::new("D").with_moves(vec![guard()]).build_ref();
        let mut battle = create_test_battle(vec![
            vec![a.clone()],
            vec![b.clone()],
            vec![c.clone(), d.clone()],
        ]);

        advance_until(&mut battle, BattleState::CheckingVictory);
        assert!(!b.is_fighting());
        assert_eq!(battle.teams().len(), 2);
        assert_eq!(c.team_id(), Some(1));
        assert_eq!(d.team_id(), Some(1));
        assert_eq!(d.fighter_id(), Some(1));
        assert!(battle.roster().is_consistent());

        battle.advance();
        assert_eq!(battle.state(), BattleState::StartingTurn);
        battle.advance();
        assert!(Arc::ptr_eq(battle.actor().unwrap(), &c));
    }

    #[test]
    fn test_removed_fighters_cleared_next_turn() {
        let (mut battle, _a, _b, _c) = two_versus_one();
        for _ in 0..3 {
            advance_until(&mut battle, BattleState::StartingTurn);
            battle.advance();
        }
        advance_until(&mut battle, BattleState::StartingTurn);
        assert_eq!(battle.removed_fighters().len(), 1);
        battle.advance();
        assert!(battle.removed_fighters().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_random_battles_keep_ids_dense_and_end_with_one_team(
            team_sizes in prop::collection::vec(1usize..4, 2..4),
            seed in any::<u64>(),
        ) {
            let mut next_seed = seed;
            let teams: Vec<Vec<CombatantRef>> = team_sizes
                .iter()
                .enumerate()
                .map(|(t, &size)| {
                    (0..size)
                        .map(|f| {
                            next_seed = next_seed.wrapping_add(1);
                            TestCombatantBuilder::new(&format!("T{}F{}", t, f))
                                .hp(8)
                                .with_moves(vec![strike(2), guard()])
                                .controller(random_ai(next_seed))
                                .build_ref()
                        })
                        .collect()
                })
                .collect();
            let everyone: Vec<CombatantRef> = teams.iter().flatten().cloned().collect();
            let mut battle = Battle::new(teams, seeded_config().with_seed(seed)).unwrap();

            let mut steps = 0;
            while battle.advance() {
                steps += 1;
                prop_assert!(steps < 20_000, "battle did not terminate");
                prop_assert!(battle.roster().is_consistent());
                if battle.state() == BattleState::StartingTurn {
                    prop_assert!(battle.teams().len() >= 2);
                }
                if battle.state() == BattleState::Looting {
                    prop_assert!(battle.teams().len() <= 1);
                }
            }

            prop_assert_eq!(battle.state(), BattleState::Ending);
            prop_assert!(battle.teams().len() <= 1);
            for fighter in &everyone {
                prop_assert_eq!(fighter.is_fighting(), battle.roster().contains(fighter));
            }
        }
    }
}
