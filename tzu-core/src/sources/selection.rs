//! Current source selection

use std::fmt;
use std::sync::{PoisonError, RwLock};

/// An entry of the source list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Choice {
    /// The local copy pseudo-entry (always index 0)
    #[default]
    LocalCopy,

    /// A published version, by identifier
    Remote(String),
}

impl Choice {
    /// Identifier of a remote choice
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Choice::LocalCopy => None,
            Choice::Remote(id) => Some(id),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Choice::LocalCopy)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::LocalCopy => f.write_str("local copy"),
            Choice::Remote(id) => f.write_str(id),
        }
    }
}

/// The currently selected entry
///
/// Starts on the local copy and only changes through [`Selection::set`].
/// The value is not checked against the catalog; resolving an unknown
/// choice simply yields nothing.
#[derive(Debug, Default)]
pub struct Selection {
    current: RwLock<Choice>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Choice {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, choice: Choice) {
        tracing::debug!("Selected source: {}", choice);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = choice;
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;

    #[test]
    fn test_defaults_to_local_copy() {
        assert_eq!(Selection::new().get(), Choice::LocalCopy);
    }

    #[test]
    fn test_set_overwrites_without_validation() {
        let selection = Selection::new();

        selection.set(Choice::Remote("no-such-version".to_string()));
        assert_eq!(selection.get(), Choice::Remote("no-such-version".to_string()));

        selection.set(Choice::LocalCopy);
        assert!(selection.get().is_local());
    }

    #[test]
    fn test_identifier() {
        assert_eq!(Choice::Remote("2007k".into()).identifier(), Some("2007k"));
        assert_eq!(Choice::LocalCopy.identifier(), None);
    }
}
