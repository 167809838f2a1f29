use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a push into a full buffer does. Fixed when the buffer is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Evict the oldest element to make room.
    #[default]
    Overwrite,
    /// Drop the incoming element.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown overwrite policy '{0}' (expected 'overwrite' or 'ignore')")]
pub struct ParsePolicyError(pub String);

impl OverwritePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Ignore    => "ignore",
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OverwritePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" | "drop-oldest" => Ok(Self::Overwrite),
            "ignore"    | "drop-newest" => Ok(Self::Ignore),
            _                           => Err(ParsePolicyError(s.to_string())),
        }
    }
}
