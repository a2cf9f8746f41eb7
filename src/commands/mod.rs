pub mod engine;
pub mod rules;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::errors::CoreError;

pub use engine::{Command, CommandEngine, CommandOutcome, CommandStats};
pub use rules::ValidationRule;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Parallel,
    Recursive,
    Persistent,
}

impl CommandType {
    pub const ALL: [CommandType; 3] = [Self::Parallel, Self::Recursive, Self::Persistent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Recursive => "recursive",
            Self::Persistent => "persistent",
        }
    }

    /// Command type a rule applies to, taken from its `<type>-` id prefix.
    pub fn for_rule(rule_id: &str) -> Option<CommandType> {
        Self::ALL
            .into_iter()
            .find(|t| rule_id.strip_prefix(t.as_str()).is_some_and(|rest| rest.starts_with('-')))
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(Self::Parallel),
            "recursive" => Ok(Self::Recursive),
            "persistent" => Ok(Self::Persistent),
            other => Err(CoreError::UnknownCommandType(other.to_string())),
        }
    }
}
