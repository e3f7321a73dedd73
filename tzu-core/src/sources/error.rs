//! Source discovery error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while inspecting the local copy or discovering remote versions
///
/// None of these reach catalog readers. Local inspection errors degrade the
/// local entry, discovery errors end the current pass.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The local resource file does not exist
    #[error("Local copy ({path}) does not exist")]
    LocalMissing { path: PathBuf },

    /// The local resource file could not be read
    #[error("Failed to read local copy {path}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local resource file carries no recognizable version tag
    #[error("Failed to determine version of local copy {path}")]
    VersionNotFound { path: PathBuf },

    /// A listing or entry location could not be turned into a URL
    #[error("Malformed source location: {location}")]
    MalformedLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// Opening or reading the listing failed
    #[error("Failed to fetch source listing from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The listing server answered with a non-success status
    #[error("Failed to fetch source listing: HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The listing markup could not be tokenized
    #[error("Malformed source listing: unterminated tag at offset {offset}")]
    MalformedListing { offset: usize },

    /// Failed to read the configuration file
    #[error("Failed to read source config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse source config: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Failed to serialize the configuration
    #[error("Failed to serialize source config")]
    ConfigSerialize {
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Failed to write the configuration file
    #[error("Failed to write source config: {path}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No configuration directory could be determined for this platform
    #[error("Could not determine config directory")]
    NoConfigDir,
}

impl SourceError {
    /// Whether the tool stays usable after this error
    ///
    /// Local inspection problems only reduce what the local entry can tell.
    pub fn is_degraded_local(&self) -> bool {
        matches!(
            self,
            SourceError::LocalMissing { .. }
                | SourceError::LocalRead { .. }
                | SourceError::VersionNotFound { .. }
        )
    }
}
