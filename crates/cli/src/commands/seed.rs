//! Seed the catalog from a YAML file.
//!
//! The file is a list of products in the same shape `/addproduct` accepts:
//!
//! ```yaml
//! - name: Striped Flutter Sleeve Blouse
//!   category: women
//!   images: ["http://localhost:4000/images/product_1.png"]
//!   new_price: 50.0
//!   old_price: 80.5
//!   sizes:
//!     - { name: S, quantity: 4 }
//!     - { name: M, quantity: 2 }
//! ```
//!
//! Every entry is validated before the database is touched. Identifiers are
//! allocated by the repository, so seeding twice creates duplicates.

use std::path::Path;

use tracing::{error, info};

use threadline_core::NewProduct;
use threadline_storefront::db::{self, ProductRepository};

/// Parse and validate a YAML product list.
///
/// Returns every validation failure, labelled with the entry's position.
fn parse_products(content: &str) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    let raw: Vec<NewProduct> = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();
    for (index, product) in raw.into_iter().enumerate() {
        match product.validate() {
            Ok(product) => products.push(product),
            Err(e) => errors.push(format!("entry {}: {e}", index + 1)),
        }
    }

    if !errors.is_empty() {
        error!("Product file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    Ok(products)
}

/// Read and validate the product list at `path`.
async fn load_products(path: &Path) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading products from file");

    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    info!(products = products.len(), "Parsed product list");

    Ok(products)
}

/// Create catalog products from a YAML file.
///
/// # Errors
///
/// Returns an error if the database URL is unset, the file cannot be read or
/// fails validation, or an insert fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Read and validate YAML before connecting to database
    let products = load_products(Path::new(file_path)).await?;
    let database_url = super::database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repo = ProductRepository::new(&pool);
    for product in &products {
        let created = repo.create(product).await?;
        info!(id = %created.id, name = %created.name, "Created product");
    }

    info!("Seeding complete!");
    info!("  Products created: {}", products.len());

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
- name: '  Striped Blouse '
  category: women
  images: [a.png, b.png]
  new_price: 50
  old_price: 80.5
  sizes:
    - { name: S, quantity: 4 }
- name: Cargo Shorts
  category: men
  new_price: 20.25
  old_price: 25
";

    #[test]
    fn test_parse_products_trims_and_keeps_order() {
        let products = parse_products(CATALOG).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Striped Blouse");
        assert_eq!(products[0].first_image(), Some("a.png"));
        assert_eq!(products[1].name, "Cargo Shorts");
        assert!(products[1].sizes.is_empty());
    }

    #[test]
    fn test_parse_products_reports_invalid_entries() {
        let yaml = "
- name: Fine
  category: men
  new_price: 1
  old_price: 2
- name: ''
  category: men
  new_price: 1
  old_price: 2
";
        let err = parse_products(yaml).unwrap_err();
        assert_eq!(err.to_string(), "1 validation errors found");
    }

    #[test]
    fn test_parse_products_rejects_negative_price() {
        let yaml = "- { name: X, category: men, new_price: -3, old_price: 2 }";
        assert!(parse_products(yaml).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_products(&dir.path().join("absent.yaml")).await.unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[tokio::test]
    async fn test_load_products_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, CATALOG).unwrap();

        let products = load_products(&path).await.unwrap();
        assert_eq!(products.len(), 2);
    }
}
