//! Content packs: action definitions, combatant templates and battle rules
//! loaded from RON files, plus the factory that stamps combatants out of them.

use crate::actions::{Action, ActionLibrary};
use crate::battle::selection::ActionSelector;
use crate::combatant::{Combatant, CombatantRef};
use crate::config::BattleConfig;
use crate::errors::{BattleResult, RosterError, RosterResult};
use schema::CombatantTemplate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const ACTIONS_FILE: &str = "actions.ron";
pub const COMBATANTS_FILE: &str = "combatants.ron";
pub const BATTLE_CONFIG_FILE: &str = "battle.ron";

/// Creates combatants from templates, resolving their move ids against an
/// action library.
#[derive(Debug, Clone)]
pub struct CombatantFactory {
    templates: BTreeMap<u32, CombatantTemplate>,
    library: ActionLibrary,
}

impl CombatantFactory {
    /// Every template needs at least one move, and every move id it names
    /// must exist in `library`.
    pub fn new(templates: Vec<CombatantTemplate>, library: ActionLibrary) -> RosterResult<Self> {
        let mut by_id = BTreeMap::new();
        for template in templates {
            if template.moves.is_empty() {
                return Err(RosterError::NoMoves(template.id));
            }
            for &move_id in &template.moves {
                library.template(move_id)?;
            }
            if let Some(previous) = by_id.insert(template.id, template) {
                warn!(id = previous.id, name = %previous.name, "combatant template replaced");
            }
        }
        Ok(Self {
            templates: by_id,
            library,
        })
    }

    pub fn from_ron_str(source: &str, library: ActionLibrary) -> RosterResult<Self> {
        let templates: Vec<CombatantTemplate> = ron::from_str(source)?;
        Self::new(templates, library)
    }

    pub fn load(path: &Path, library: ActionLibrary) -> RosterResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content, library)
    }

    pub fn template(&self, template_id: u32) -> RosterResult<&CombatantTemplate> {
        self.templates
            .get(&template_id)
            .ok_or(RosterError::InvalidIndex(template_id))
    }

    pub fn templates(&self) -> impl Iterator<Item = &CombatantTemplate> {
        self.templates.values()
    }

    pub fn library(&self) -> &ActionLibrary {
        &self.library
    }

    /// Create a combatant at `level` with full vitals and its own stats.
    pub fn create(
        &self,
        template_id: u32,
        level: u32,
        controller: Arc<dyn ActionSelector>,
    ) -> RosterResult<CombatantRef> {
        if level < 1 {
            return Err(RosterError::InvalidLevel(level));
        }
        let template = self.template(template_id)?;
        let moves = template
            .moves
            .iter()
            .map(|&id| self.library.get(id))
            .collect::<Result<Vec<Action>, _>>()?;

        let combatant = Combatant::from_template(template, level, moves, controller)?;
        Ok(Arc::new(combatant))
    }
}

/// Everything a battle needs from disk.
#[derive(Debug, Clone)]
pub struct ContentPack {
    pub config: BattleConfig,
    pub factory: CombatantFactory,
}

impl ContentPack {
    /// Load `actions.ron` and `combatants.ron` from `dir`, and `battle.ron`
    /// if present (defaults otherwise).
    pub fn load(dir: &Path) -> BattleResult<Self> {
        let config_path = dir.join(BATTLE_CONFIG_FILE);
        let config = if config_path.exists() {
            BattleConfig::load(&config_path)?
        } else {
            BattleConfig::default()
        };

        let library = ActionLibrary::load(&dir.join(ACTIONS_FILE), &config)?;
        let factory = CombatantFactory::load(&dir.join(COMBATANTS_FILE), library)?;
        info!(
            dir = %dir.display(),
            actions = factory.library().len(),
            combatants = factory.templates.len(),
            "content pack loaded"
        );
        Ok(Self { config, factory })
    }

    pub fn create(
        &self,
        template_id: u32,
        level: u32,
        controller: Arc<dyn ActionSelector>,
    ) -> RosterResult<CombatantRef> {
        self.factory.create(template_id, level, controller)
    }
}
