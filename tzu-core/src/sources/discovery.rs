//! Remote version discovery
//!
//! Fetches the directory listing and feeds every listed version into a
//! [`SourceCatalog`], one insertion at a time.

use std::time::Duration;
use url::Url;

use super::{extract_versions, SourceCatalog, SourceConfig, SourceError};

/// Fetch the listing document at `url`
///
/// The response is owned by this function and released on every return
/// path, including read failures.
pub async fn fetch_listing(url: &Url, timeout: Duration) -> Result<String, SourceError> {
    let fetch_err = |source: reqwest::Error| SourceError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("tzu/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;

    tracing::debug!("Fetching source listing from {}", url);
    let response = client.get(url.clone()).send().await.map_err(fetch_err)?;

    if !response.status().is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(fetch_err)
}

/// Insert every version listed in `document` into `catalog`
///
/// Returns the number of new entries. Stops at the first markup error;
/// entries inserted before it stay in the catalog. A listed name that does
/// not form a valid location is logged and skipped.
pub fn discover_into(
    catalog: &SourceCatalog,
    config: &SourceConfig,
    document: &str,
) -> Result<usize, SourceError> {
    let mut added = 0;

    for identifier in extract_versions(document) {
        let identifier = identifier?;

        let location = match config.entry_location(&identifier) {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!("Skipping listed version '{}': {}", identifier, e);
                continue;
            }
        };

        if catalog.insert(identifier, location).is_some() {
            added += 1;
        }
    }

    Ok(added)
}

/// Fetch the configured listing and populate `catalog` from it
pub async fn discover(
    catalog: &SourceCatalog,
    config: &SourceConfig,
) -> Result<usize, SourceError> {
    let url = config.listing_url()?;
    let document = fetch_listing(&url, config.timeout()).await?;

    let added = discover_into(catalog, config, &document)?;
    tracing::info!(
        "Discovered {} new source(s) from {} ({} total)",
        added,
        url,
        catalog.remote_count()
    );

    Ok(added)
}
