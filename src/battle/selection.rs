//! How a combatant picks its move and target.
//!
//! The battle only sees the `ActionSelector` trait. NPCs use `RandomAi`;
//! human-driven combatants use a `ChannelSelector`, which forwards each
//! decision to a UI over channels and blocks until the UI replies or the
//! battle is canceled.

use crate::actions::Action;
use crate::battle::control::BattleControl;
use crate::combatant::{Combatant, CombatantRef};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// A trait for anything that can choose a combatant's action and target.
///
/// Both calls may block. They return `None` only once `control` has been
/// canceled, and must do so promptly so the battle step that invoked them
/// can unwind.
pub trait ActionSelector: Send + Sync {
    /// Pick one of `moves` and return a fresh copy of it.
    fn select_action(
        &self,
        fighter: &Combatant,
        moves: &[Action],
        control: &BattleControl,
    ) -> Option<Action>;

    /// Pick the target for an action that did not target itself.
    fn select_target(
        &self,
        fighter: &Combatant,
        action: &Action,
        teams: &[Vec<CombatantRef>],
        control: &BattleControl,
    ) -> Option<CombatantRef>;

    /// Whether decisions come from a person.
    fn is_interactive(&self) -> bool {
        false
    }
}

/// A decision the UI is asked to make.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SelectionRequest {
    Action {
        fighter: String,
        moves: Vec<String>,
    },
    Target {
        fighter: String,
        action: String,
        teams: Vec<Vec<String>>,
    },
}

/// The UI's answer to a `SelectionRequest`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReply {
    /// Index into the offered moves
    Action(usize),
    /// Team index and member index within that team
    Target { team: usize, member: usize },
}

/// The UI's end of a `ChannelSelector`.
#[derive(Debug, Clone)]
pub struct SelectionPort {
    pub requests: Receiver<SelectionRequest>,
    pub replies: Sender<SelectionReply>,
}

impl SelectionPort {
    /// Wait for the next request and answer it with `decide`.
    pub fn answer_next(
        &self,
        decide: impl FnOnce(&SelectionRequest) -> SelectionReply,
    ) -> Option<SelectionRequest> {
        let request = self.requests.recv().ok()?;
        self.replies.send(decide(&request)).ok()?;
        Some(request)
    }
}

/// Human-driven selection over a request/reply channel pair.
#[derive(Debug)]
pub struct ChannelSelector {
    requests: Sender<SelectionRequest>,
    replies: Receiver<SelectionReply>,
}

impl ChannelSelector {
    /// Create a selector and the port a UI uses to answer it.
    pub fn pair() -> (Arc<Self>, SelectionPort) {
        let (request_tx, request_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();
        let selector = Arc::new(Self {
            requests: request_tx,
            replies: reply_rx,
        });
        let port = SelectionPort {
            requests: request_rx,
            replies: reply_tx,
        };
        (selector, port)
    }

    /// Send `request` and wait for a reply. `None` means the battle was
    /// canceled; a vanished UI cancels it too, since nobody is left to play.
    fn round_trip(
        &self,
        request: SelectionRequest,
        control: &BattleControl,
    ) -> Option<SelectionReply> {
        if control.is_canceled() {
            return None;
        }
        // Stale answers from an interrupted round trip are not ours.
        while self.replies.try_recv().is_ok() {}

        if self.requests.send(request).is_err() {
            warn!("selection UI disconnected, canceling battle");
            control.cancel();
            return None;
        }

        let cancellation = control.cancellation();
        select! {
            recv(self.replies) -> reply => match reply {
                Ok(reply) => Some(reply),
                Err(_) => {
                    warn!("selection UI disconnected, canceling battle");
                    control.cancel();
                    None
                }
            },
            recv(cancellation) -> _ => {
                debug!("selection interrupted by cancel");
                None
            }
        }
    }
}

impl ActionSelector for ChannelSelector {
    fn select_action(
        &self,
        fighter: &Combatant,
        moves: &[Action],
        control: &BattleControl,
    ) -> Option<Action> {
        let request = SelectionRequest::Action {
            fighter: fighter.name().to_string(),
            moves: moves.iter().map(|action| action.name().to_string()).collect(),
        };
        loop {
            match self.round_trip(request.clone(), control)? {
                SelectionReply::Action(index) => match moves.get(index) {
                    Some(action) => return Some(action.instantiate()),
                    None => warn!(index, "selected move index out of range, asking again"),
                },
                other => warn!(?other, "expected an action reply, asking again"),
            }
        }
    }

    fn select_target(
        &self,
        fighter: &Combatant,
        action: &Action,
        teams: &[Vec<CombatantRef>],
        control: &BattleControl,
    ) -> Option<CombatantRef> {
        let request = SelectionRequest::Target {
            fighter: fighter.name().to_string(),
            action: action.name().to_string(),
            teams: teams
                .iter()
                .map(|team| team.iter().map(|c| c.name().to_string()).collect())
                .collect(),
        };
        loop {
            match self.round_trip(request.clone(), control)? {
                SelectionReply::Target { team, member } => {
                    match teams.get(team).and_then(|members| members.get(member)) {
                        Some(target) => return Some(target.clone()),
                        None => warn!(team, member, "selected target out of range, asking again"),
                    }
                }
                other => warn!(?other, "expected a target reply, asking again"),
            }
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}
