//! Row mutation states.
//!
//! A row is always in exactly one [`RowState`]. The legal transitions are enforced by
//! [`Row`](crate::Row); this module only names the states and their wire literals.
//!
//! ```text
//!               mark_added
//!            +-------------> Added ----+
//!            |                         |
//! Unchanged -+ mark_modified           | mark_deleted
//!            +-------------> Modified -+-------------> Deleted (terminal)
//!            |                         |
//!            +-------------------------+
//! ```

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The mutation classification of a row relative to its baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RowState {
    #[default]
    Unchanged,
    Added,
    Modified,
    Deleted,
}

impl RowState {
    pub const ALL: [RowState; 4] = [
        RowState::Unchanged,
        RowState::Added,
        RowState::Modified,
        RowState::Deleted,
    ];

    /// Returns the literal written in the `RowState` property.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::RowState;
    ///
    /// assert_eq!(RowState::Modified.as_str(), "Modified");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RowState::Unchanged => "Unchanged",
            RowState::Added => "Added",
            RowState::Modified => "Modified",
            RowState::Deleted => "Deleted",
        }
    }

    /// Parses a wire literal. Exact, case-sensitive match.
    #[must_use]
    pub fn from_literal(s: &str) -> Option<RowState> {
        RowState::ALL.into_iter().find(|state| state.as_str() == s)
    }

    /// Parses a wire literal ignoring ASCII case, as the legacy layout allows.
    #[must_use]
    pub fn from_literal_ignore_case(s: &str) -> Option<RowState> {
        RowState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
    }

    /// Returns `true` for every state except [`RowState::Unchanged`].
    #[inline]
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        !matches!(self, RowState::Unchanged)
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowState::from_literal(s).ok_or_else(|| Error::custom(format!("unknown row state '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_exact() {
        for state in RowState::ALL {
            assert_eq!(RowState::from_literal(state.as_str()), Some(state));
        }
        assert_eq!(RowState::from_literal("added"), None);
        assert_eq!(RowState::from_literal("Removed"), None);
    }

    #[test]
    fn test_ignore_case() {
        assert_eq!(
            RowState::from_literal_ignore_case("MODIFIED"),
            Some(RowState::Modified)
        );
        assert_eq!(RowState::from_literal_ignore_case("deleted"), Some(RowState::Deleted));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Added".parse::<RowState>().unwrap(), RowState::Added);
        assert!("Gone".parse::<RowState>().is_err());
        assert!(!RowState::Unchanged.is_changed());
        assert!(RowState::Deleted.is_changed());
    }
}
