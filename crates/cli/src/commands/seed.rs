//! Seed the product catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - id: 3f6c1a52-8e1d-4c1b-9a0e-2b7d5c9e1f01
//!     name: Linen Shirt
//!     price: 45.00
//!     stock: 24
//! ```
//!
//! Products are upserted by `id`. Carts keep the name and price they
//! snapshotted, so re-pricing here never changes existing cart items.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use wardrobe_core::Product;
use wardrobe_storefront::db::{self, PgProductCatalog, RepositoryError};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level shape of the seed file.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub products: Vec<Product>,
}

/// Check a seed file for problems the database would reject less clearly.
fn validate(seed: &ProductSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for product in &seed.products {
        if product.name.trim().is_empty() {
            errors.push(format!("{}: name is empty", product.id));
        }
        if product.stock < 0 {
            errors.push(format!("{}: stock is negative", product.id));
        }
        if !seen.insert(product.id) {
            errors.push(format!("{}: duplicate id", product.id));
        }
    }

    errors
}

/// Upsert products from a YAML file.
///
/// # Errors
///
/// Returns `SeedError` if the file is missing or invalid, or a database
/// operation fails.
pub async fn products(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: ProductSeed = serde_yaml::from_str(&content)?;
    info!(products = seed.products.len(), "Parsed seed file");

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let catalog = PgProductCatalog::new(pool);
    for product in &seed.products {
        catalog.upsert(product).await?;
        info!(id = %product.id, name = %product.name, "Upserted product");
    }

    info!("Seeding complete! {} product(s) upserted", seed.products.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let seed: ProductSeed =
            serde_yaml::from_str(include_str!("../../seed/products.yaml")).unwrap();
        assert_eq!(seed.products.len(), 4);
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_negative_price_rejected_at_parse() {
        let yaml = r"
products:
  - id: 3f6c1a52-8e1d-4c1b-9a0e-2b7d5c9e1f01
    name: X
    price: -1.5
    stock: 1
";
        assert!(serde_yaml::from_str::<ProductSeed>(yaml).is_err());
    }

    #[test]
    fn test_validate_flags_problems() {
        let yaml = r"
products:
  - id: 3f6c1a52-8e1d-4c1b-9a0e-2b7d5c9e1f01
    name: ' '
    price: 1.0
    stock: -2
  - id: 3f6c1a52-8e1d-4c1b-9a0e-2b7d5c9e1f01
    name: Dup
    price: 1.0
    stock: 1
";
        let seed: ProductSeed = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(validate(&seed).len(), 3);
    }
}
