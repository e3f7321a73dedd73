//! Source CLI commands
//!
//! Provides commands for listing the available time zone data sources,
//! resolving a choice, and inspecting the local copy.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use tzu_core::sources::{
    extract_versions, ChannelObserver, LocalCopy, ResourceVersionReader, SourceCatalog,
    SourceConfig, SourceContext, SourceModel,
};

#[derive(Subcommand, Debug)]
pub enum SourcesCommand {
    /// Discover published versions and list them after the local copy
    List {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Resolve a source (version or local copy label) to its location
    Show {
        /// Version identifier or local copy label
        choice: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Inspect the local copy
    Local {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Extract versions from a saved listing document
    Scan {
        /// Path to the listing HTML
        path: PathBuf,
    },

    /// Manage the source configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },
}

impl SourcesCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            SourcesCommand::List { json } => execute_list(config_path, json).await,
            SourcesCommand::Show { choice, json } => {
                execute_show(config_path, &choice, json).await
            }
            SourcesCommand::Local { json } => execute_local(config_path, json),
            SourcesCommand::Scan { path } => execute_scan(&path),
            SourcesCommand::Config { command } => execute_config(config_path, command),
        }
    }
}

fn load_config(config_path: Option<&Path>) -> Result<SourceConfig> {
    match config_path {
        Some(path) => SourceConfig::load_from_path(path)
            .with_context(|| format!("Failed to load source config {}", path.display())),
        None => SourceConfig::load().context("Failed to load source config"),
    }
}

fn load_context(config_path: Option<&Path>) -> Result<Arc<SourceContext>> {
    match config_path {
        Some(_) => SourceContext::initialize(load_config(config_path)?, &ResourceVersionReader)
            .context("Invalid source configuration"),
        None => SourceContext::global().context("Invalid source configuration"),
    }
}

/// Build a model and run discovery, reporting how many entries were announced
async fn discovered_model(config_path: Option<&Path>) -> Result<SourceModel> {
    let model = SourceModel::new(load_context(config_path)?);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    model.subscribe(Arc::new(ChannelObserver::new(tx)));

    tracing::info!("Fetching source listing from {}", model.context().listing_url());
    model.find_sources().await;

    let mut announced = 0;
    while let Ok(interval) = rx.try_recv() {
        tracing::debug!("Entry added at index {}", interval.start);
        announced += 1;
    }
    tracing::debug!("{} entries announced", announced);

    Ok(model)
}

/// Table row for the source list
#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Location")]
    location: String,
}

fn display_or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

async fn execute_list(config_path: Option<&Path>, json_output: bool) -> Result<()> {
    let model = discovered_model(config_path).await?;
    let local = model.catalog().local().clone();

    let mut rows = vec![SourceRow {
        index: 0,
        source: local.label.clone(),
        version: display_or_dash(local.version.as_deref()),
        location: display_or_dash(local.location.as_ref()),
    }];
    rows.extend(
        model
            .entries()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| SourceRow {
                index: i + 1,
                version: entry.identifier.clone(),
                source: entry.identifier,
                location: entry.location.to_string(),
            }),
    );

    if json_output {
        let json_rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "index": row.index,
                    "source": row.source,
                    "version": (row.version != "-").then_some(&row.version),
                    "location": (row.location != "-").then_some(&row.location),
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_rows)?);
        return Ok(());
    }

    if rows.len() == 1 {
        println!("\nNo published versions found.");
    } else {
        println!("\nFound {} published version(s):\n", rows.len() - 1);
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

async fn execute_show(config_path: Option<&Path>, choice: &str, json_output: bool) -> Result<()> {
    let model = discovered_model(config_path).await?;
    model.set_selected_item(choice);

    let location = model
        .selected_location()
        .with_context(|| format!("Source '{choice}' has no location"))?;
    let version = model.selected_version();

    if json_output {
        let output = serde_json::json!({
            "source": model.selected_item(),
            "version": version,
            "location": location.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("Source:   {}", model.selected_item());
        println!("Version:  {}", display_or_dash(version));
        println!("Location: {location}");
    }

    Ok(())
}

fn execute_local(config_path: Option<&Path>, json_output: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let path = config.local_path();
    let local = LocalCopy::inspect(&path, &ResourceVersionReader);

    if json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "label": local.label,
            "version": local.version,
            "location": local.location.as_ref().map(|u| u.as_str()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Path:     {}", path.display());
        println!("Label:    {}", local.label);
        println!("Version:  {}", display_or_dash(local.version.as_deref()));
        println!("Location: {}", display_or_dash(local.location.as_ref()));
    }

    Ok(())
}

fn execute_scan(path: &Path) -> Result<()> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read listing {}", path.display()))?;

    let identifiers = extract_versions(&document)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse listing {}", path.display()))?;

    println!("Listed ({}):", identifiers.len());
    for identifier in &identifiers {
        println!("  {identifier}");
    }

    let config = SourceConfig::default();
    let catalog = SourceCatalog::new(LocalCopy::missing());
    for identifier in identifiers {
        match config.entry_location(&identifier) {
            Ok(location) => {
                catalog.insert(identifier, location);
            }
            Err(e) => tracing::warn!("Skipping '{}': {}", identifier, e),
        }
    }

    println!("\nSorted ({}):", catalog.remote_count());
    for entry in catalog.entries() {
        println!("  {}", entry.identifier);
    }

    Ok(())
}

fn execute_config(config_path: Option<&Path>, command: ConfigCommand) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => SourceConfig::default_config_path()?,
    };

    match command {
        ConfigCommand::Show => {
            let config = load_config(Some(path.as_path()))?;
            println!("# {}", path.display());
            println!("baseUrl:     {}", config.base_url);
            println!("entrySuffix: {}", config.entry_suffix);
            println!("localFile:   {}", config.local_file.display());
            println!("timeoutSecs: {}", config.timeout_secs);
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            SourceConfig::default().save_to_path(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
