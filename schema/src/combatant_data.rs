use serde::{Deserialize, Serialize};

/// Base value and per-level gain for one stat.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatGrowth {
    pub base: i32,
    pub gain: i32,
}

impl StatGrowth {
    pub const fn new(base: i32, gain: i32) -> Self {
        Self { base, gain }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttributeGrowth {
    pub strength: StatGrowth,
    pub defense: StatGrowth,
    pub agility: StatGrowth,
    pub intellect: StatGrowth,
    pub spirit: StatGrowth,
    pub luck: StatGrowth,
}

impl AttributeGrowth {
    /// Attributes in the same order as `StatKind::attribute_index`.
    pub fn as_array(&self) -> [StatGrowth; 6] {
        [
            self.strength,
            self.defense,
            self.agility,
            self.intellect,
            self.spirit,
            self.luck,
        ]
    }
}

/// Template a combatant is stamped from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CombatantTemplate {
    pub id: u32,
    pub name: String,
    pub attributes: AttributeGrowth,
    pub hp: StatGrowth,
    pub mp: StatGrowth,
    /// Action definition ids this combatant knows.
    pub moves: Vec<u32>,
}
