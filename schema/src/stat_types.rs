use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every stat a combatant carries. The first six are fixed attributes, the
/// last two are vitals with a drainable current value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatKind {
    Strength,
    Defense,
    Agility,
    Intellect,
    Spirit,
    Luck,
    Hp,
    Mp,
}

/// The two stats with a bounded current value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Vital {
    Hp,
    Mp,
}

impl StatKind {
    /// Number of fixed attributes (everything except the vitals).
    pub const ATTRIBUTE_COUNT: usize = 6;

    /// Position of this stat in a combatant's attribute array, `None` for vitals.
    pub fn attribute_index(self) -> Option<usize> {
        match self {
            StatKind::Strength => Some(0),
            StatKind::Defense => Some(1),
            StatKind::Agility => Some(2),
            StatKind::Intellect => Some(3),
            StatKind::Spirit => Some(4),
            StatKind::Luck => Some(5),
            StatKind::Hp | StatKind::Mp => None,
        }
    }

    pub fn as_vital(self) -> Option<Vital> {
        match self {
            StatKind::Hp => Some(Vital::Hp),
            StatKind::Mp => Some(Vital::Mp),
            _ => None,
        }
    }

    pub fn is_vital(self) -> bool {
        self.as_vital().is_some()
    }
}

impl From<Vital> for StatKind {
    fn from(vital: Vital) -> Self {
        match vital {
            Vital::Hp => StatKind::Hp,
            Vital::Mp => StatKind::Mp,
        }
    }
}
