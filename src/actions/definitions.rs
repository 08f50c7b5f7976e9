//! Turning content-file action definitions into action templates.

use super::{Action, ActionId};
use crate::config::BattleConfig;
use crate::errors::{DefinitionError, DefinitionResult};
use schema::{ActionDefinition, StatKind, Vital};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Every action template known to a content pack, keyed by definition id.
#[derive(Debug, Clone, Default)]
pub struct ActionLibrary {
    templates: BTreeMap<ActionId, Action>,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from definitions in order. Items may only point at
    /// actions defined earlier in the list.
    pub fn from_definitions(
        definitions: &[ActionDefinition],
        config: &BattleConfig,
    ) -> DefinitionResult<Self> {
        let mut library = Self::new();
        for definition in definitions {
            let action = library.parse(definition, config)?;
            library.insert(action)?;
        }
        debug!(count = library.len(), "action library loaded");
        Ok(library)
    }

    /// Parse a RON list of definitions.
    pub fn from_ron_str(source: &str, config: &BattleConfig) -> DefinitionResult<Self> {
        let definitions: Vec<ActionDefinition> = ron::from_str(source)?;
        Self::from_definitions(&definitions, config)
    }

    pub fn load(path: &Path, config: &BattleConfig) -> DefinitionResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content, config)
    }

    pub fn insert(&mut self, action: Action) -> DefinitionResult<()> {
        let id = action.id();
        if self.templates.contains_key(&id) {
            return Err(DefinitionError::DuplicateId(id));
        }
        self.templates.insert(id, action);
        Ok(())
    }

    /// A fresh, unbound copy of the action with this id.
    pub fn get(&self, id: ActionId) -> DefinitionResult<Action> {
        self.template(id).map(Action::instantiate)
    }

    pub fn template(&self, id: ActionId) -> DefinitionResult<&Action> {
        self.templates
            .get(&id)
            .ok_or(DefinitionError::InvalidIndex(id))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn parse(&self, definition: &ActionDefinition, config: &BattleConfig) -> DefinitionResult<Action> {
        let args = Args { definition };
        let id = definition.id;

        let action = match definition.kind.to_ascii_lowercase().as_str() {
            "attack" => {
                args.expect_len(&[2])?;
                Action::attack(id, args.name()?, args.parse(1, "effect")?)
            }
            "defense" => match args.expect_len(&[1, 3])? {
                1 => Action::defend(id, args.name()?, config.defend_multiplier, config.defend_turns),
                _ => Action::defend(
                    id,
                    args.name()?,
                    args.parse(1, "multiplier")?,
                    args.parse(2, "turns")?,
                ),
            },
            "flee" => {
                args.expect_len(&[1])?;
                Action::flee(id, args.name()?)
            }
            "item" => {
                args.expect_len(&[2])?;
                let bound = self.template(args.parse(1, "action id")?)?;
                Action::use_item(id, args.name()?, bound.clone())
            }
            "spell" => {
                args.expect_len(&[3])?;
                Action::spell(
                    id,
                    args.name()?,
                    args.parse(1, "cost")?,
                    args.parse(2, "effect")?,
                )
            }
            "heal" => {
                args.expect_len(&[4])?;
                Action::heal(
                    id,
                    args.name()?,
                    args.parse(1, "cost")?,
                    args.parse(2, "amount")?,
                    args.parse::<Vital>(3, "vital")?,
                )
            }
            "enchant" => {
                args.expect_len(&[5])?;
                Action::enchant(
                    id,
                    args.name()?,
                    args.parse(1, "cost")?,
                    args.parse::<StatKind>(2, "stat")?,
                    args.parse(3, "multiplier")?,
                    args.parse(4, "turns")?,
                )
            }
            "regen" => {
                args.expect_len(&[5])?;
                Action::regen(
                    id,
                    args.name()?,
                    args.parse(1, "cost")?,
                    args.parse::<Vital>(2, "vital")?,
                    args.parse(3, "amount")?,
                    args.parse(4, "turns")?,
                )
            }
            _ => {
                return Err(DefinitionError::UnknownKind {
                    id,
                    kind: definition.kind.clone(),
                })
            }
        };
        Ok(action)
    }
}

/// Positional argument access with errors that name the offending definition.
struct Args<'a> {
    definition: &'a ActionDefinition,
}

impl Args<'_> {
    fn malformed(&self, reason: String) -> DefinitionError {
        DefinitionError::MalformedArgs {
            id: self.definition.id,
            kind: self.definition.kind.clone(),
            reason,
        }
    }

    fn expect_len(&self, allowed: &[usize]) -> DefinitionResult<usize> {
        let len = self.definition.args.len();
        if allowed.contains(&len) {
            Ok(len)
        } else {
            Err(self.malformed(format!(
                "expected {:?} arguments, got {}",
                allowed, len
            )))
        }
    }

    fn name(&self) -> DefinitionResult<&str> {
        match self.definition.args.first().map(|name| name.trim()) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(self.malformed("missing name".to_string())),
        }
    }

    fn parse<T: FromStr>(&self, index: usize, what: &str) -> DefinitionResult<T> {
        let raw = self
            .definition
            .args
            .get(index)
            .ok_or_else(|| self.malformed(format!("missing {}", what)))?;
        raw.trim()
            .parse()
            .map_err(|_| self.malformed(format!("invalid {} '{}'", what, raw)))
    }
}
