//! Time zone data sources - discovery and selection
//!
//! This module finds the published versions of the ICU time zone resource
//! (`zoneinfo.res`), tracks the version of the local copy, and presents
//! both as one ordered, selectable list.
//!
//! # Overview
//!
//! The sources system allows callers to:
//! - Discover remote versions from a directory listing
//! - Inspect the locally installed `zoneinfo.res`
//! - Resolve a choice to a fetch location and a version label
//! - Receive a notification for every entry added to the list
//!
//! # Architecture
//!
//! ```text
//! ICU repository (HTTP directory listing)
//!     │
//!     ├── 2007h/be/zoneinfo.res
//!     ├── 2007j/be/zoneinfo.res
//!     └── 2007k/be/zoneinfo.res
//!            │
//!            ▼  listing ──► extract_versions ──► SourceCatalog ──► observers
//!                                                    ▲
//!     ./zoneinfo.res ──► LocalCopy::inspect ─────────┘ (index 0)
//! ```

mod catalog;
mod config;
mod discovery;
mod error;
mod listing;
mod local;
mod model;
mod selection;

pub use catalog::{CatalogEntry, CatalogObserver, ChannelObserver, Interval, SourceCatalog};
pub use config::{
    SourceConfig, DEFAULT_BASE_URL, DEFAULT_ENTRY_SUFFIX, DEFAULT_LOCAL_FILE, DEFAULT_TIMEOUT_SECS,
};
pub use discovery::{discover, discover_into, fetch_listing};
pub use error::SourceError;
pub use listing::{extract_versions, ListingScanner};
pub use local::{
    LocalCopy, ResourceVersionReader, VersionReader, LOCAL_LABEL, LOCAL_MISSING_LABEL,
};
pub use model::{SourceContext, SourceModel};
pub use selection::{Choice, Selection};
