use serde::{Deserialize, Serialize};

/// A data-driven action definition as it appears in content files.
///
/// `kind` selects the action variant and `args` carries its positional
/// parameters; the first argument is always the display name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionDefinition {
    pub id: u32,
    pub kind: String,
    pub args: Vec<String>,
}

impl ActionDefinition {
    pub fn new(id: u32, kind: &str, args: &[&str]) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}
