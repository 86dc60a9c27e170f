//! Catalog validation command.
//!
//! Parses a catalog document with the same rules the storefront applies at
//! startup and prints a short summary of what it contains.

use std::path::Path;

use wallposter_core::{Catalog, CatalogError};

/// Errors from checking a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogCheckError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

/// Validate the catalog at `path`.
pub async fn check(path: &Path) -> Result<(), CatalogCheckError> {
    let document = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogCheckError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let catalog = Catalog::from_json(&document)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", summary(&catalog));
    }
    Ok(())
}

fn summary(catalog: &Catalog) -> String {
    let facets = catalog.facets();
    let variants: usize = catalog.products().iter().map(|p| p.variants.len()).sum();

    format!(
        "{} products, {} variants\ncategories: {}\norientations: {}\nsizes: {}",
        catalog.len(),
        variants,
        facets.categories.join(", "),
        facets.orientations.join(", "),
        facets.sizes.join(", "),
    )
}
