#[cfg(test)]
mod tests {
    use crate::actions::Action;
    use crate::battle::control::BattleControl;
    use crate::battle::narration::{BattleEvent, EventLog, Narrator};
    use crate::battle::runner::{BattleEnded, BattleRunner, RunOutcome};
    use crate::battle::state::{BattleState, RemovalReason};
    use crate::battle::tests::common::{create_test_battle, guard, strike, TestCombatantBuilder};
    use crate::battle::engine::Battle;
    use pretty_assertions::assert_eq;
    use schema::{StatKind, Vital};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn quick_battle() -> Battle {
        let a = TestCombatantBuilder::new("A")
            .with_moves(vec![strike(100)])
            .build_ref();
        let b = TestCombatantBuilder::new("B")
            .hp(20)
            .with_moves(vec![guard()])
            .build_ref();
        create_test_battle(vec![vec![a], vec![b]])
    }

    /// Records like an `EventLog`, but cancels the run on the first failure.
    struct CancelOnFailure {
        log: EventLog,
        control: BattleControl,
    }

    impl Narrator for CancelOnFailure {
        fn record(&mut self, event: BattleEvent) {
            if matches!(event, BattleEvent::ActionFailed { .. }) {
                self.control.cancel();
            }
            self.log.record(event);
        }
    }

    #[test]
    fn test_run_narrates_in_state_order() {
        let log = EventLog::shared();
        let mut runner = BattleRunner::new(quick_battle()).with_narrator(log.clone());

        assert_eq!(runner.run(), RunOutcome::Completed);
        assert!(runner.battle().is_over());

        let events = log.lock().events().to_vec();
        assert_eq!(
            events,
            vec![
                BattleEvent::TurnStarted {
                    turn: 1,
                    fighter: "A".to_string(),
                    regenerated_mana: 0
                },
                BattleEvent::ActionPrepared {
                    fighter: "A".to_string(),
                    action: "Strike".to_string(),
                    targets: vec!["B".to_string()]
                },
                BattleEvent::ActionUsed {
                    fighter: "A".to_string(),
                    action: "Strike".to_string()
                },
                BattleEvent::DamageDealt {
                    target: "B".to_string(),
                    stat: Vital::Hp,
                    amount: 101
                },
                BattleEvent::StatUpdated {
                    combatant: "B".to_string(),
                    stat: Vital::Hp,
                    current: 0,
                    max: 20
                },
                BattleEvent::FighterRemoved {
                    fighter: "B".to_string(),
                    team_id: 1,
                    reason: RemovalReason::Defeated
                },
                BattleEvent::Victory {
                    winners: vec!["A".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_cancel_stops_narration_at_next_checkpoint() {
        let hex = Action::enchant(1, "Hex", 20, StatKind::Defense, 0.5, 2);
        let a = TestCombatantBuilder::new("A").mp(0).with_moves(vec![hex]).build_ref();
        let b = TestCombatantBuilder::new("B").with_moves(vec![guard()]).build_ref();
        let battle = create_test_battle(vec![vec![a], vec![b]]);

        let runner = BattleRunner::new(battle);
        let narrator = CancelOnFailure {
            log: EventLog::new(),
            control: runner.control(),
        };
        let shared = Arc::new(parking_lot::Mutex::new(narrator));
        let mut runner = runner.with_narrator(shared.clone());

        assert_eq!(runner.run(), RunOutcome::Canceled);
        let narrator = shared.lock();
        assert!(matches!(
            narrator.log.events().last(),
            Some(BattleEvent::ActionFailed { .. })
        ));
        assert_eq!(runner.battle().state(), BattleState::ApplyingBuffs);
    }

    #[test]
    fn test_paused_run_makes_no_progress_until_resumed() {
        let log = EventLog::shared();
        let runner = BattleRunner::new(quick_battle()).with_narrator(log.clone());
        runner.control().pause();
        let handle = runner.spawn_background().expect("thread spawns");

        thread::sleep(Duration::from_millis(40));
        assert!(handle.is_paused());
        assert!(!handle.is_finished());
        assert!(log.lock().is_empty());

        handle.resume();
        let (outcome, battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Completed);
        assert!(battle.is_over());
        assert!(!log.lock().is_empty());
    }

    #[test]
    fn test_cancel_while_paused_leaves_battle_untouched() {
        let log = EventLog::shared();
        let runner = BattleRunner::new(quick_battle()).with_narrator(log.clone());
        runner.control().pause();
        let handle = runner.spawn_background().expect("thread spawns");

        handle.cancel();
        let (outcome, battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Canceled);
        assert_eq!(battle.state(), BattleState::StartingTurn);
        assert_eq!(battle.turn_number(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_displayed_battle_reports_its_end_once() {
        let ended = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ended);
        let handle = BattleRunner::new(quick_battle())
            .spawn_displayed(move |battle| {
                assert!(battle.is_over());
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("thread spawns");

        let (outcome, _battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_canceled_displayed_battle_skips_end_callback() {
        let ended = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ended);
        let runner = BattleRunner::new(quick_battle());
        runner.control().pause();
        let handle = runner
            .spawn_displayed(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("thread spawns");

        handle.cancel();
        let (outcome, _battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Canceled);
        assert_eq!(ended.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_owner_hears_about_the_end_on_its_own_thread() {
        let (ended_tx, ended_rx) = crossbeam_channel::bounded(1);
        let handle = BattleRunner::new(quick_battle())
            .spawn_displayed_to(ended_tx)
            .expect("thread spawns");

        let ended = ended_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("completion reaches the owner");
        assert_eq!(
            ended,
            BattleEnded {
                turns: 1,
                winners: vec!["A".to_string()],
            }
        );

        let (outcome, _battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Completed);
    }

    #[test]
    fn test_canceled_battle_sends_no_completion() {
        let (ended_tx, ended_rx) = crossbeam_channel::bounded(1);
        let runner = BattleRunner::new(quick_battle());
        runner.control().pause();
        let handle = runner.spawn_displayed_to(ended_tx).expect("thread spawns");

        handle.cancel();
        let (outcome, _battle) = handle.join().expect("battle thread finished cleanly");
        assert_eq!(outcome, RunOutcome::Canceled);
        assert!(ended_rx.try_recv().is_err());
    }

    #[test]
    fn test_background_battles_run_side_by_side() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                BattleRunner::new(quick_battle())
                    .spawn_background()
                    .expect("thread spawns")
            })
            .collect();

        for handle in handles {
            let (outcome, battle) = handle.join().expect("battle thread finished cleanly");
            assert_eq!(outcome, RunOutcome::Completed);
            assert_eq!(battle.turn_number(), 1);
        }
    }
}
