//! Catalog loading.
//!
//! The catalog is read once at startup from a file or URL. A catalog that
//! cannot be loaded does not stop the server: the storefront runs with an
//! empty catalog and shows the load error instead of products.

use std::time::Duration;

use thiserror::Error;

use wallposter_core::{Catalog, CatalogError};

use crate::config::CatalogSource;

/// Upper bound on fetching a remote catalog.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("could not read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not fetch catalog: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog fetch returned {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

/// Result of loading the catalog: the catalog to serve, plus the error that
/// forced an empty one.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub error: Option<CatalogLoadError>,
}

/// Load the catalog, falling back to an empty one on failure.
pub async fn load(source: &CatalogSource) -> LoadedCatalog {
    match try_load(source).await {
        Ok(catalog) => {
            tracing::info!(%source, products = catalog.len(), "Catalog loaded");
            LoadedCatalog {
                catalog,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(%source, error = %e, "Failed to load catalog, serving an empty one");
            LoadedCatalog {
                catalog: Catalog::empty(),
                error: Some(e),
            }
        }
    }
}

/// Load and validate the catalog document.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the document cannot be read or fails
/// validation.
pub async fn try_load(source: &CatalogSource) -> Result<Catalog, CatalogLoadError> {
    let document = match source {
        CatalogSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CatalogLoadError::Io {
                    path: path.display().to_string(),
                    source,
                })?
        }
        CatalogSource::Url(url) => {
            let response = reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()?
                .get(url.clone())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogLoadError::Status(status));
            }
            response.text().await?
        }
    };

    Ok(Catalog::from_json(&document)?)
}
