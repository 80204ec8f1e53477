use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{MemoryError, Result};

/// The fixed partitions of the memory store.
///
/// Five categories hold lists of entries and accept mutation. `ProtocolState`
/// is a single system-managed record that can only be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    UserPreferences,
    ProjectLearnings,
    Decisions,
    Corrections,
    Patterns,
    ProtocolState,
}

impl Category {
    /// Categories that hold entries, in storage order.
    pub const MUTABLE: [Category; 5] = [
        Category::UserPreferences,
        Category::ProjectLearnings,
        Category::Decisions,
        Category::Corrections,
        Category::Patterns,
    ];

    pub const ALL: [Category; 6] = [
        Category::UserPreferences,
        Category::ProjectLearnings,
        Category::Decisions,
        Category::Corrections,
        Category::Patterns,
        Category::ProtocolState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UserPreferences => "user-preferences",
            Category::ProjectLearnings => "project-learnings",
            Category::Decisions => "decisions",
            Category::Corrections => "corrections",
            Category::Patterns => "patterns",
            Category::ProtocolState => "protocol-state",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Category::ProtocolState)
    }

    /// Reject the read-only category before any lock or I/O happens.
    pub fn ensure_writable(self) -> Result<Self> {
        if self.is_read_only() {
            return Err(MemoryError::ReadOnlyViolation { category: self });
        }
        Ok(self)
    }

    /// Name of the backing file under the store's base directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MemoryError::UnknownCategory {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_name() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "todo-list".parse::<Category>().unwrap_err();
        assert!(matches!(err, MemoryError::UnknownCategory { .. }));
    }

    #[test]
    fn padded_name_is_not_a_category() {
        for raw in [" decisions", "decisions ", "decisions\n"] {
            assert!(raw.parse::<Category>().is_err(), "{:?}", raw);
        }
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::ProjectLearnings).unwrap();
        assert_eq!(json, "\"project-learnings\"");
        let parsed: Category = serde_json::from_str("\"protocol-state\"").unwrap();
        assert_eq!(parsed, Category::ProtocolState);
    }

    #[test]
    fn only_protocol_state_is_read_only() {
        assert!(Category::ProtocolState.ensure_writable().is_err());
        for category in Category::MUTABLE {
            assert_eq!(category.ensure_writable().unwrap(), category);
        }
    }
}
