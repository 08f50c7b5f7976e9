//! Actions: one concrete use of a move.
//!
//! Combatants keep template actions and hand out fresh copies per use
//! (`instantiate`), so no two uses ever share outcome storage. The origin
//! is shared, never owned: copies point at the same combatant.

use crate::buffs::Buff;
use crate::combatant::CombatantRef;
use schema::{StatKind, Vital};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod definitions;
pub mod resolution;

pub use definitions::ActionLibrary;
pub use resolution::{escape_advantage, escape_succeeds};

pub type ActionId = u32;

/// What a mana-costed skill does once paid for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillEffect {
    /// `round(effect + origin.intellect / target.spirit)` damage
    Damage,
    /// Restore `effect` points of the effect vital
    Restore,
    /// No direct effect; the target buff does the work
    Enchant,
}

#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Free physical hit on the first target
    Attack,
    /// Free self-targeted guard that buffs defense
    Defend,
    /// Escape attempt; the cost phase is the success roll
    Flee { opponents: Vec<CombatantRef> },
    /// Fires the wrapped item's action with no cost and forced success
    UseItem { item: Box<Action> },
    /// Mana-costed ability
    Skill(SkillEffect),
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Defend => "defense",
            ActionKind::Flee { .. } => "flee",
            ActionKind::UseItem { .. } => "item",
            ActionKind::Skill(SkillEffect::Damage) => "spell",
            ActionKind::Skill(SkillEffect::Restore) => "heal",
            ActionKind::Skill(SkillEffect::Enchant) => "enchant",
        }
    }
}

/// Outcome of an action on one target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Damage {
        stat: Vital,
        amount: u32,
    },
    /// `actual` may fall short of `requested` when the vital is capped
    Recovery {
        stat: Vital,
        requested: u32,
        actual: u32,
    },
    Unaffected,
}

#[derive(Debug, Clone)]
pub struct Action {
    id: ActionId,
    name: String,
    kind: ActionKind,
    effect_amount: i32,
    cost_amount: u32,
    cost_stat: Option<Vital>,
    effect_stat: Vital,
    origin: Option<CombatantRef>,
    targets: Vec<CombatantRef>,
    effects: Vec<Effect>,
    successful: bool,
    origin_buff: Option<Buff>,
    target_buff: Option<Buff>,
}

impl Action {
    fn base(id: ActionId, name: &str, kind: ActionKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            effect_amount: 0,
            cost_amount: 0,
            cost_stat: None,
            effect_stat: Vital::Hp,
            origin: None,
            targets: Vec::new(),
            effects: Vec::new(),
            successful: false,
            origin_buff: None,
            target_buff: None,
        }
    }

    pub fn attack(id: ActionId, name: &str, effect: i32) -> Self {
        Self {
            effect_amount: effect,
            ..Self::base(id, name, ActionKind::Attack)
        }
    }

    pub fn defend(id: ActionId, name: &str, multiplier: f64, turns: u32) -> Self {
        Self {
            origin_buff: Some(Buff::modifier(name, StatKind::Defense, multiplier, turns)),
            ..Self::base(id, name, ActionKind::Defend)
        }
    }

    pub fn flee(id: ActionId, name: &str) -> Self {
        Self::base(
            id,
            name,
            ActionKind::Flee {
                opponents: Vec::new(),
            },
        )
    }

    pub fn use_item(id: ActionId, name: &str, item: Action) -> Self {
        Self::base(
            id,
            name,
            ActionKind::UseItem {
                item: Box::new(item.instantiate()),
            },
        )
    }

    /// Mana-costed damage skill.
    pub fn spell(id: ActionId, name: &str, cost: u32, power: i32) -> Self {
        Self {
            effect_amount: power,
            ..Self::skill(id, name, cost, SkillEffect::Damage)
        }
    }

    /// Mana-costed restoration of `vital` on the target.
    pub fn heal(id: ActionId, name: &str, cost: u32, amount: i32, vital: Vital) -> Self {
        Self {
            effect_amount: amount,
            effect_stat: vital,
            ..Self::skill(id, name, cost, SkillEffect::Restore)
        }
    }

    /// Mana-costed stat modifier on the target.
    pub fn enchant(
        id: ActionId,
        name: &str,
        cost: u32,
        stat: StatKind,
        multiplier: f64,
        turns: u32,
    ) -> Self {
        Self {
            target_buff: Some(Buff::modifier(name, stat, multiplier, turns)),
            ..Self::skill(id, name, cost, SkillEffect::Enchant)
        }
    }

    /// Mana-costed periodic effect on the target; negative `amount` drains.
    pub fn regen(id: ActionId, name: &str, cost: u32, vital: Vital, amount: i32, turns: u32) -> Self {
        Self {
            effect_stat: vital,
            target_buff: Some(Buff::periodic(name, vital, amount, turns)),
            ..Self::skill(id, name, cost, SkillEffect::Enchant)
        }
    }

    fn skill(id: ActionId, name: &str, cost: u32, effect: SkillEffect) -> Self {
        Self {
            cost_amount: cost,
            cost_stat: Some(Vital::Mp),
            ..Self::base(id, name, ActionKind::Skill(effect))
        }
    }

    /// A fresh copy for a single use: same recipe and origin, empty outcome.
    pub fn instantiate(&self) -> Self {
        let mut copy = self.clone();
        copy.effects.clear();
        copy.successful = false;
        copy
    }

    // === Accessors ===

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn effect_amount(&self) -> i32 {
        self.effect_amount
    }

    pub fn cost_amount(&self) -> u32 {
        self.cost_amount
    }

    pub fn cost_stat(&self) -> Option<Vital> {
        self.cost_stat
    }

    pub fn effect_stat(&self) -> Vital {
        self.effect_stat
    }

    pub fn origin(&self) -> Option<&CombatantRef> {
        self.origin.as_ref()
    }

    pub fn targets(&self) -> &[CombatantRef] {
        &self.targets
    }

    /// Per-target outcomes, aligned with `targets()` once applied.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn was_successful(&self) -> bool {
        self.successful
    }

    pub fn origin_buff(&self) -> Option<&Buff> {
        self.origin_buff.as_ref()
    }

    pub fn target_buff(&self) -> Option<&Buff> {
        self.target_buff.as_ref()
    }

    pub fn is_flee(&self) -> bool {
        matches!(self.kind, ActionKind::Flee { .. })
    }

    // === Binding ===

    /// Bind the acting combatant. Self-targeting kinds target it right away.
    pub fn set_origin(&mut self, origin: CombatantRef) {
        if matches!(self.kind, ActionKind::Defend | ActionKind::Flee { .. }) {
            self.targets = vec![origin.clone()];
        }
        self.origin = Some(origin);
    }

    pub fn set_targets(&mut self, targets: Vec<CombatantRef>) {
        self.targets = targets;
    }

    /// Who a flee attempt is running from. No-op for other kinds.
    pub fn set_opponents(&mut self, others: Vec<CombatantRef>) {
        if let ActionKind::Flee { opponents } = &mut self.kind {
            *opponents = others;
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
