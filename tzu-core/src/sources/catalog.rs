//! Version catalog
//!
//! Keeps every discovered version keyed by identifier in ascending order,
//! next to the local copy pseudo-entry. The visible list is:
//!
//! ```text
//! index 0      local copy label
//! index 1..N   remote identifiers, sorted
//! ```
//!
//! Entries are only ever added. Each new entry is announced to observers with
//! its position in the visible list.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use super::{Choice, LocalCopy};

/// Receives list change notifications from a [`SourceCatalog`]
pub trait CatalogObserver: Send + Sync {
    /// Entries `start..=end` of the visible list were added
    fn interval_added(&self, start: usize, end: usize);
}

/// An inclusive range of visible list positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

/// Observer that forwards notifications to a channel
///
/// Lets the owner of a list receive additions on its own task while
/// discovery runs elsewhere.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<Interval>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<Interval>) -> Self {
        Self { sender }
    }
}

impl CatalogObserver for ChannelObserver {
    fn interval_added(&self, start: usize, end: usize) {
        // A closed receiver means nobody is listening anymore
        let _ = self.sender.send(Interval { start, end });
    }
}

/// A discovered version and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub identifier: String,
    pub location: Url,
}

/// Sorted catalog of remote versions plus the local copy
pub struct SourceCatalog {
    local: LocalCopy,
    entries: RwLock<BTreeMap<String, Url>>,
    observers: RwLock<Vec<Arc<dyn CatalogObserver>>>,
}

impl SourceCatalog {
    /// Create an empty catalog around the local copy entry
    pub fn new(local: LocalCopy) -> Self {
        Self {
            local,
            entries: RwLock::new(BTreeMap::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer for entry additions
    pub fn subscribe(&self, observer: Arc<dyn CatalogObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// The local copy pseudo-entry
    pub fn local(&self) -> &LocalCopy {
        &self.local
    }

    /// Add a discovered version
    ///
    /// Returns the visible index of the new entry and notifies observers at
    /// that index. The index is the 1-based rank of `identifier` among the
    /// remote identifiers, since slot 0 belongs to the local copy.
    ///
    /// Inserting a known identifier replaces its location and returns `None`
    /// without a notification.
    pub fn insert(&self, identifier: impl Into<String>, location: Url) -> Option<usize> {
        let identifier = identifier.into();

        let rank = {
            let mut entries = self.write_entries();
            if entries.insert(identifier.clone(), location).is_some() {
                tracing::debug!("Replaced location of {}", identifier);
                return None;
            }
            entries.range::<String, _>(..=&identifier).count()
        };

        tracing::debug!("Added source {} at index {}", identifier, rank);
        self.notify(rank, rank);
        Some(rank)
    }

    fn notify(&self, start: usize, end: usize) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in observers {
            observer.interval_added(start, end);
        }
    }

    /// Number of visible entries (remote versions plus the local copy)
    pub fn size(&self) -> usize {
        self.remote_count() + 1
    }

    /// Number of remote versions
    pub fn remote_count(&self) -> usize {
        self.read_entries().len()
    }

    /// Label of the visible entry at `index`
    ///
    /// Index 0 is the local copy label. Indexes at or past the remote count
    /// resolve to nothing, which leaves the greatest identifier out of reach
    /// by index; use [`SourceCatalog::entries`] to walk every version.
    pub fn at(&self, index: usize) -> Option<String> {
        match self.choice_at(index)? {
            Choice::LocalCopy => Some(self.local.label.clone()),
            Choice::Remote(id) => Some(id),
        }
    }

    /// Typed form of [`SourceCatalog::at`]
    pub fn choice_at(&self, index: usize) -> Option<Choice> {
        if index == 0 {
            return Some(Choice::LocalCopy);
        }

        let entries = self.read_entries();
        if index >= entries.len() {
            return None;
        }

        entries
            .keys()
            .nth(index - 1)
            .map(|id| Choice::Remote(id.clone()))
    }

    /// Interpret a label or identifier as a choice
    pub fn classify(&self, choice: &str) -> Choice {
        if self.local.matches(choice) {
            Choice::LocalCopy
        } else {
            Choice::Remote(choice.to_string())
        }
    }

    /// Fetch location for a label or identifier
    pub fn location_of(&self, choice: &str) -> Option<Url> {
        self.location(&self.classify(choice))
    }

    /// Fetch location for a choice
    ///
    /// The local copy resolves to its file URL, if it exists.
    pub fn location(&self, choice: &Choice) -> Option<Url> {
        match choice {
            Choice::LocalCopy => self.local.location.clone(),
            Choice::Remote(id) => self.read_entries().get(id).cloned(),
        }
    }

    /// Version label for a label or identifier
    pub fn version_label_of(&self, choice: &str) -> Option<String> {
        self.version_label(&self.classify(choice))
    }

    /// Version label for a choice
    ///
    /// A remote identifier is its own version label.
    pub fn version_label(&self, choice: &Choice) -> Option<String> {
        match choice {
            Choice::LocalCopy => self.local.version.clone(),
            Choice::Remote(id) => Some(id.clone()),
        }
    }

    /// Whether `identifier` has been discovered
    pub fn contains(&self, identifier: &str) -> bool {
        self.read_entries().contains_key(identifier)
    }

    /// Greatest discovered identifier
    pub fn latest(&self) -> Option<String> {
        self.read_entries().keys().next_back().cloned()
    }

    /// Snapshot of all remote entries in ascending order
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.read_entries()
            .iter()
            .map(|(identifier, location)| CatalogEntry {
                identifier: identifier.clone(),
                location: location.clone(),
            })
            .collect()
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, BTreeMap<String, Url>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Url>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCatalog")
            .field("local", &self.local)
            .field("entries", &*self.read_entries())
            .finish_non_exhaustive()
    }
}
