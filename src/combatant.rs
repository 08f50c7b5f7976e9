use crate::actions::{Action, ActionKind};
use crate::battle::control::BattleControl;
use crate::battle::selection::ActionSelector;
use crate::buffs::{Buff, BuffBook, BuffKind, BuffTick};
use crate::errors::{BattleSetupError, RosterError, RosterResult};
use crate::stats::{Stat, VariableStat};
use parking_lot::Mutex;
use schema::{CombatantTemplate, StatKind, Vital};
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Combatants are shared between the battle thread and any display thread.
pub type CombatantRef = Arc<Combatant>;

/// Where a combatant sits while registered in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    /// Position within the team, kept dense as members leave
    pub fighter_id: usize,
    pub team_id: usize,
}

/// An entity that takes part in battles, player- or AI-controlled.
///
/// Every field is either immutable or behind its own lock, so a UI may read
/// stats while the battle thread mutates them.
pub struct Combatant {
    name: String,
    level: AtomicU32,
    xp: AtomicU64,
    attributes: [Stat; StatKind::ATTRIBUTE_COUNT],
    hp: VariableStat,
    mp: VariableStat,
    moves: Vec<Action>,
    controller: Arc<dyn ActionSelector>,
    seat: Mutex<Option<Seat>>,
    // Only allocated between start_fighting and stop_fighting.
    buffs: Mutex<Option<BuffBook>>,
}

impl Combatant {
    /// Stamp a combatant from a template. Every stat is a fresh instance.
    pub fn from_template(
        template: &CombatantTemplate,
        level: u32,
        moves: Vec<Action>,
        controller: Arc<dyn ActionSelector>,
    ) -> RosterResult<Self> {
        if level < 1 {
            return Err(RosterError::InvalidLevel(level));
        }

        let attributes = template.attributes.as_array().map(Stat::from);

        Ok(Self {
            name: template.name.clone(),
            level: AtomicU32::new(level),
            xp: AtomicU64::new(0),
            attributes,
            hp: VariableStat::from_growth(template.hp, level),
            mp: VariableStat::from_growth(template.mp, level),
            moves,
            controller,
            seat: Mutex::new(None),
            buffs: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level.load(Ordering::SeqCst)
    }

    pub fn xp(&self) -> u64 {
        self.xp.load(Ordering::SeqCst)
    }

    pub fn add_xp(&self, amount: u64) {
        self.xp.fetch_add(amount, Ordering::SeqCst);
    }

    /// Gain a level and refill both vitals.
    pub fn level_up(&self) -> u32 {
        let level = self.level.fetch_add(1, Ordering::SeqCst) + 1;
        self.hp.restore(level);
        self.mp.restore(level);
        debug!(combatant = %self.name, level, "level up");
        level
    }

    pub fn moves(&self) -> &[Action] {
        &self.moves
    }

    pub fn is_interactive(&self) -> bool {
        self.controller.is_interactive()
    }

    // === Stats ===

    pub fn attribute(&self, kind: StatKind) -> Option<&Stat> {
        kind.attribute_index().map(|index| &self.attributes[index])
    }

    pub fn vital(&self, vital: Vital) -> &VariableStat {
        match vital {
            Vital::Hp => &self.hp,
            Vital::Mp => &self.mp,
        }
    }

    /// Effective value of an attribute, or the max of a vital.
    pub fn stat(&self, kind: StatKind) -> i32 {
        let level = self.level();
        match kind.as_vital() {
            Some(vital) => self.vital(vital).max(level),
            None => self
                .attribute(kind)
                .map(|stat| stat.effective(level))
                .unwrap_or_default(),
        }
    }

    pub fn strength(&self) -> i32 {
        self.stat(StatKind::Strength)
    }

    pub fn defense(&self) -> i32 {
        self.stat(StatKind::Defense)
    }

    pub fn agility(&self) -> i32 {
        self.stat(StatKind::Agility)
    }

    pub fn intellect(&self) -> i32 {
        self.stat(StatKind::Intellect)
    }

    pub fn spirit(&self) -> i32 {
        self.stat(StatKind::Spirit)
    }

    pub fn hp(&self) -> i32 {
        self.hp.current()
    }

    pub fn max_hp(&self) -> i32 {
        self.hp.max(self.level())
    }

    pub fn mp(&self) -> i32 {
        self.mp.current()
    }

    pub fn max_mp(&self) -> i32 {
        self.mp.max(self.level())
    }

    pub fn is_alive(&self) -> bool {
        self.hp() > 0
    }

    /// Current and max of a vital, read together for display.
    pub fn read_vital(&self, vital: Vital) -> (i32, i32) {
        self.vital(vital).read(self.level())
    }

    pub fn set_hp(&self, hp: i32) {
        self.hp.set_current(hp, self.level());
    }

    pub fn set_mp(&self, mp: i32) {
        self.mp.set_current(mp, self.level());
    }

    /// Restore `floor(max_mp * rate)` mana and return that amount.
    pub fn regenerate_mana(&self, rate: f64) -> u32 {
        let level = self.level();
        let amount = (self.mp.max(level).max(0) as f64 * rate).floor() as u32;
        self.mp.gain(amount, level);
        amount
    }

    fn apply_modifier(&self, stat: StatKind, multiplier: f64) {
        let level = self.level();
        match (stat.as_vital(), self.attribute(stat)) {
            (Some(vital), _) => self.vital(vital).add_modifier(multiplier, level),
            (None, Some(attribute)) => attribute.add_modifier(multiplier),
            (None, None) => {}
        }
    }

    fn remove_modifier(&self, stat: StatKind, multiplier: f64) {
        let level = self.level();
        match (stat.as_vital(), self.attribute(stat)) {
            (Some(vital), _) => self.vital(vital).remove_modifier(multiplier, level),
            (None, Some(attribute)) => attribute.remove_modifier(multiplier),
            (None, None) => {}
        }
    }

    // === Battle registration ===

    /// Register this combatant in a battle and allocate its buff storage.
    pub fn start_fighting(&self, fighter_id: usize, team_id: usize) -> Result<(), BattleSetupError> {
        let mut seat = self.seat.lock();
        if seat.is_some() {
            return Err(BattleSetupError::AlreadyFighting(self.name.clone()));
        }
        *seat = Some(Seat {
            fighter_id,
            team_id,
        });
        *self.buffs.lock() = Some(BuffBook::new());
        Ok(())
    }

    /// Leave the battle: undo applied modifiers, drop buff storage, clear ids.
    pub fn stop_fighting(&self) {
        let leftover = self
            .buffs
            .lock()
            .take()
            .map(|mut book| book.drain_active())
            .unwrap_or_default();
        for buff in leftover {
            self.deactivate(&buff);
        }
        *self.seat.lock() = None;
    }

    pub fn seat(&self) -> Option<Seat> {
        *self.seat.lock()
    }

    pub fn is_fighting(&self) -> bool {
        self.seat().is_some()
    }

    pub fn fighter_id(&self) -> Option<usize> {
        self.seat().map(|seat| seat.fighter_id)
    }

    pub fn team_id(&self) -> Option<usize> {
        self.seat().map(|seat| seat.team_id)
    }

    pub(crate) fn set_fighter_id(&self, fighter_id: usize) {
        if let Some(seat) = self.seat.lock().as_mut() {
            seat.fighter_id = fighter_id;
        }
    }

    pub(crate) fn set_team_id(&self, team_id: usize) {
        if let Some(seat) = self.seat.lock().as_mut() {
            seat.team_id = team_id;
        }
    }

    // === Buffs ===

    /// Attach a buff. Ignored (returns false) outside of a battle.
    pub fn add_buff(&self, buff: Buff) -> bool {
        match self.buffs.lock().as_mut() {
            Some(book) => {
                book.push(buff);
                true
            }
            None => {
                warn!(combatant = %self.name, %buff, "buff added outside of battle, ignoring");
                false
            }
        }
    }

    pub fn active_buffs(&self) -> Vec<Buff> {
        self.buffs
            .lock()
            .as_ref()
            .map(|book| book.active().to_vec())
            .unwrap_or_default()
    }

    /// Buffs that expired at the start of this combatant's turn.
    pub fn expired_buffs(&self) -> Vec<Buff> {
        self.buffs
            .lock()
            .as_ref()
            .map(|book| book.expired().to_vec())
            .unwrap_or_default()
    }

    /// Count down every buff once and retire the ones that ran out,
    /// undoing their modifiers. Returns the newly expired buffs.
    pub fn remove_expired_buffs(&self) -> Vec<Buff> {
        let expired = match self.buffs.lock().as_mut() {
            Some(book) => book.expire(),
            None => return Vec::new(),
        };
        for buff in &expired {
            self.deactivate(buff);
        }
        expired
    }

    pub fn empty_expired_buffs(&self) {
        if let Some(book) = self.buffs.lock().as_mut() {
            book.clear_expired();
        }
    }

    /// Let every active buff take effect: modifiers activate once, periodic
    /// buffs fire every call.
    pub fn apply_buffs(&self) -> Vec<BuffTick> {
        let mut guard = self.buffs.lock();
        let Some(book) = guard.as_mut() else {
            return Vec::new();
        };

        let level = self.level();
        let mut ticks = Vec::new();
        for buff in book.active_mut() {
            match buff.kind.clone() {
                BuffKind::Modifier { stat, multiplier } => {
                    if !buff.applied {
                        buff.applied = true;
                        self.apply_modifier(stat, multiplier);
                        ticks.push(BuffTick::Activated { buff: buff.clone() });
                    }
                }
                BuffKind::Periodic { vital, amount } => {
                    buff.applied = true;
                    let stat = self.vital(vital);
                    let before = stat.current();
                    if amount >= 0 {
                        stat.gain(amount.unsigned_abs(), level);
                    } else {
                        stat.lose(amount.unsigned_abs());
                    }
                    ticks.push(BuffTick::Applied {
                        buff: buff.clone(),
                        change: stat.current() - before,
                    });
                }
            }
        }
        ticks
    }

    fn deactivate(&self, buff: &Buff) {
        if let BuffKind::Modifier { stat, multiplier } = buff.kind {
            if buff.applied {
                self.remove_modifier(stat, multiplier);
            }
        }
    }

    // === Decisions ===

    /// Ask this combatant's controller for an action, then for a target if
    /// the action did not target itself. `None` means the selection was
    /// canceled.
    pub fn next_action(
        self: &Arc<Self>,
        teams: &[Vec<CombatantRef>],
        control: &BattleControl,
    ) -> Option<Action> {
        let mut action = self.controller.select_action(self, &self.moves, control)?;
        action.set_origin(Arc::clone(self));

        if matches!(action.kind(), ActionKind::Flee { .. }) {
            let own_team = self.team_id();
            let opponents = teams
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != own_team)
                .flat_map(|(_, team)| team.iter().cloned())
                .collect();
            action.set_opponents(opponents);
        }

        if action.targets().is_empty() {
            let target = self
                .controller
                .select_target(self, &action, teams, control)?;
            action.set_targets(vec![target]);
        }

        Some(action)
    }
}

impl fmt::Debug for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("hp", &self.hp())
            .field("mp", &self.mp())
            .field("seat", &self.seat())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
