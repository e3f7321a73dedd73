//! Source list model
//!
//! [`SourceContext`] holds what is computed once per process: the parsed
//! listing URL and the inspected local copy. Each [`SourceModel`] built on it
//! owns a catalog and a selection, and is what a front end talks to.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use url::Url;

use super::{
    discover, CatalogEntry, CatalogObserver, Choice, LocalCopy, ResourceVersionReader, Selection,
    SourceCatalog, SourceConfig, SourceError, VersionReader,
};

static GLOBAL_CONTEXT: OnceCell<Arc<SourceContext>> = OnceCell::new();

/// Configuration and local copy state shared by every model
#[derive(Debug)]
pub struct SourceContext {
    config: SourceConfig,
    listing_url: Url,
    local: LocalCopy,
}

impl SourceContext {
    /// Validate the configuration and inspect the local copy
    ///
    /// Fails only if the listing URL is malformed; a missing or unreadable
    /// local copy is logged and reflected in the local entry.
    pub fn initialize(
        config: SourceConfig,
        reader: &dyn VersionReader,
    ) -> Result<Arc<Self>, SourceError> {
        let listing_url = config.listing_url().inspect_err(|e| {
            tracing::error!("{}", e);
        })?;

        let local = LocalCopy::inspect(&config.local_path(), reader);

        Ok(Arc::new(Self {
            config,
            listing_url,
            local,
        }))
    }

    /// Process-wide context, built on first use
    ///
    /// Loads `sources.yaml` (or defaults) and inspects the local copy exactly
    /// once; later calls return the same context.
    pub fn global() -> Result<Arc<Self>, SourceError> {
        GLOBAL_CONTEXT
            .get_or_try_init(|| Self::initialize(SourceConfig::load()?, &ResourceVersionReader))
            .cloned()
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    pub fn local(&self) -> &LocalCopy {
        &self.local
    }
}

/// Selectable list of time zone data sources
///
/// Index 0 is the local copy, followed by discovered versions in ascending
/// order. Readers can be used while [`SourceModel::find_sources`] runs.
#[derive(Debug)]
pub struct SourceModel {
    context: Arc<SourceContext>,
    catalog: SourceCatalog,
    selection: Selection,
}

impl SourceModel {
    pub fn new(context: Arc<SourceContext>) -> Self {
        let catalog = SourceCatalog::new(context.local.clone());
        Self {
            context,
            catalog,
            selection: Selection::new(),
        }
    }

    pub fn context(&self) -> &SourceContext {
        &self.context
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Register a listener for entry additions
    pub fn subscribe(&self, observer: Arc<dyn CatalogObserver>) {
        self.catalog.subscribe(observer);
    }

    /// Discover published versions and add them to the list
    ///
    /// Errors end the pass and are logged here. Returns the number of entries
    /// added by a pass that completes, or 0 when it fails; entries added
    /// before the failure stay in the catalog either way.
    pub async fn find_sources(&self) -> usize {
        match discover(&self.catalog, &self.context.config).await {
            Ok(added) => added,
            Err(e) => {
                tracing::error!("Source discovery failed: {}", error_chain(&e));
                0
            }
        }
    }

    pub fn size(&self) -> usize {
        self.catalog.size()
    }

    pub fn element_at(&self, index: usize) -> Option<String> {
        self.catalog.at(index)
    }

    pub fn location_of(&self, choice: &str) -> Option<Url> {
        self.catalog.location_of(choice)
    }

    pub fn version_of(&self, choice: &str) -> Option<String> {
        self.catalog.version_label_of(choice)
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.catalog.entries()
    }

    pub fn selection(&self) -> Choice {
        self.selection.get()
    }

    pub fn select(&self, choice: Choice) {
        self.selection.set(choice);
    }

    /// Selected entry as it appears in the list
    pub fn selected_item(&self) -> String {
        match self.selection.get() {
            Choice::LocalCopy => self.context.local.label.clone(),
            Choice::Remote(id) => id,
        }
    }

    /// Select by label or identifier
    pub fn set_selected_item(&self, choice: &str) {
        self.selection.set(self.catalog.classify(choice));
    }

    /// Location of the selected entry
    pub fn selected_location(&self) -> Option<Url> {
        self.catalog.location(&self.selection.get())
    }

    /// Version label of the selected entry
    pub fn selected_version(&self) -> Option<String> {
        self.catalog.version_label(&self.selection.get())
    }
}

/// Render an error with its sources, outermost first
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
