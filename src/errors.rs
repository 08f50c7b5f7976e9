use thiserror::Error;

/// Main error type for the battle engine.
///
/// Battles themselves never fail at runtime; every variant here comes from
/// content loading, combatant construction or battle setup.
#[derive(Debug, Error)]
pub enum BattleEngineError {
    /// Error while turning an action definition into an action
    #[error("Action definition error: {0}")]
    Definition(#[from] DefinitionError),
    /// Error while creating combatants from templates
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),
    /// Error while assembling a battle
    #[error("Battle setup error: {0}")]
    Setup(#[from] BattleSetupError),
    /// Error while reading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading action definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The definition names a kind the engine does not know
    #[error("Unknown action kind '{kind}' for definition {id}")]
    UnknownKind { id: u32, kind: String },
    /// The argument list does not fit the kind
    #[error("Malformed arguments for {kind} definition {id}: {reason}")]
    MalformedArgs {
        id: u32,
        kind: String,
        reason: String,
    },
    /// No action definition with this id exists
    #[error("Invalid action index: {0}")]
    InvalidIndex(u32),
    /// Two definitions share an id
    #[error("Duplicate action id: {0}")]
    DuplicateId(u32),
    /// Content file could not be parsed
    #[error("Failed to parse action definitions: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Content file could not be read
    #[error("Failed to read action definitions: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the combatant factory.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Combatants start at level 1
    #[error("Invalid level: {0}")]
    InvalidLevel(u32),
    /// No combatant template with this id exists
    #[error("Invalid combatant index: {0}")]
    InvalidIndex(u32),
    /// A combatant needs at least one move to take a turn
    #[error("Combatant template {0} has no moves")]
    NoMoves(u32),
    /// A template references a broken action
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    /// Content file could not be parsed
    #[error("Failed to parse combatant templates: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Content file could not be read
    #[error("Failed to read content file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while assembling a battle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BattleSetupError {
    /// A battle needs at least two sides
    #[error("A battle needs at least two teams, got {0}")]
    TooFewTeams(usize),
    /// Every team needs at least one member
    #[error("Team {0} has no members")]
    EmptyTeam(usize),
    /// The combatant is already registered in another battle
    #[error("{0} is already fighting in another battle")]
    AlreadyFighting(String),
    /// A fighter without moves could never finish its turn
    #[error("{0} has no moves to fight with")]
    NoMoves(String),
}

/// Errors raised while reading a battle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using DefinitionError
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Type alias for Results using RosterError
pub type RosterResult<T> = Result<T, RosterError>;
