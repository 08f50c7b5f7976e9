use crate::combatant::CombatantRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The battle's position in its turn cycle. Each `Battle::advance` call does
/// the work of exactly one state and then moves to the next.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleState {
    StartingTurn,
    GettingAction,
    ApplyingAction,
    ApplyingBuffs,
    CheckingDeath,
    EndingTurn,
    CheckingVictory,
    Looting,
    Ending,
}

impl BattleState {
    /// The fixed successor, ignoring the victory branch: `CheckingVictory`
    /// goes back to `StartingTurn` here, the battle decides when to loot.
    pub fn next(self) -> Self {
        match self {
            BattleState::StartingTurn => BattleState::GettingAction,
            BattleState::GettingAction => BattleState::ApplyingAction,
            BattleState::ApplyingAction => BattleState::ApplyingBuffs,
            BattleState::ApplyingBuffs => BattleState::CheckingDeath,
            BattleState::CheckingDeath => BattleState::EndingTurn,
            BattleState::EndingTurn => BattleState::CheckingVictory,
            BattleState::CheckingVictory => BattleState::StartingTurn,
            BattleState::Looting => BattleState::Ending,
            BattleState::Ending => BattleState::Ending,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == BattleState::Ending
    }
}

impl fmt::Display for BattleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BattleState::StartingTurn => "starting turn",
            BattleState::GettingAction => "getting action",
            BattleState::ApplyingAction => "applying action",
            BattleState::ApplyingBuffs => "applying buffs",
            BattleState::CheckingDeath => "checking death",
            BattleState::EndingTurn => "ending turn",
            BattleState::CheckingVictory => "checking victory",
            BattleState::Looting => "looting",
            BattleState::Ending => "ending",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Defeated,
    Fled,
}

/// A fighter taken out of the battle during the current turn.
#[derive(Debug, Clone)]
pub struct Removal {
    pub fighter: CombatantRef,
    /// Team the fighter belonged to when it was removed
    pub team_id: usize,
    pub reason: RemovalReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_cycle_order() {
        let mut state = BattleState::StartingTurn;
        let mut seen = vec![state];
        for _ in 0..6 {
            state = state.next();
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                BattleState::StartingTurn,
                BattleState::GettingAction,
                BattleState::ApplyingAction,
                BattleState::ApplyingBuffs,
                BattleState::CheckingDeath,
                BattleState::EndingTurn,
                BattleState::CheckingVictory,
            ]
        );
        assert_eq!(state.next(), BattleState::StartingTurn);
        assert_eq!(BattleState::Looting.next(), BattleState::Ending);
        assert!(BattleState::Ending.next().is_terminal());
    }
}
