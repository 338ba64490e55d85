//! Seed the catalog from a YAML file.
//!
//! Categories, expeditions and articles are inserted in that order. Records
//! whose code (or, for expeditions, name) already exists are skipped, so
//! the command can be re-run after editing the file.
//!
//! ```yaml
//! categories:
//!   - code: BEV
//!     description: Beverages
//! expeditions:
//!   - name: Colissimo
//!     cost: "4.95"
//! articles:
//!   - code: TEA-01
//!     designation: Green tea
//!     quantity: 20
//!     price: "4.50"
//!     discount: "10"
//!     category: BEV
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use comptoir_admin::db::{ArticleRepository, CategoryRepository, ExpeditionRepository};
use comptoir_admin::models::article::NewArticle;
use comptoir_admin::models::category::NewCategory;
use comptoir_admin::models::expedition::NewExpedition;
use comptoir_core::{CategoryId, Discount};

use super::{CommandError, connect};

/// Parsed catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<NewCategory>,
    #[serde(default)]
    pub expeditions: Vec<NewExpedition>,
    #[serde(default)]
    pub articles: Vec<SeedArticle>,
}

/// An article entry; the category is named by code.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedArticle {
    pub code: String,
    pub designation: String,
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    pub price: Decimal,
    pub discount: Option<Discount>,
    pub category: String,
    pub image: Option<String>,
}

/// Counts reported once seeding finishes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl Catalog {
    /// Parse a catalog and check every entry before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Yaml` for malformed YAML and
    /// `CommandError::InvalidEntry` for the first entry failing validation.
    pub fn parse(content: &str) -> Result<Self, CommandError> {
        let catalog: Self = serde_yaml::from_str(content)?;

        for category in &catalog.categories {
            category
                .validate()
                .map_err(|e| invalid("category", &category.code, &e))?;
        }
        for expedition in &catalog.expeditions {
            expedition
                .validate()
                .map_err(|e| invalid("expedition", &expedition.name, &e))?;
        }
        for article in &catalog.articles {
            article
                .to_new_article(CategoryId::new(0))
                .validate()
                .map_err(|e| invalid("article", &article.code, &e))?;
        }

        Ok(catalog)
    }
}

impl SeedArticle {
    fn to_new_article(&self, category_id: CategoryId) -> NewArticle {
        NewArticle {
            code: self.code.clone(),
            designation: self.designation.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            price: self.price,
            discount: self.discount,
            category_id,
            image: self.image.clone(),
        }
    }
}

fn invalid(kind: &str, name: &str, errors: &validator::ValidationErrors) -> CommandError {
    CommandError::InvalidEntry(format!("{kind} '{name}': {errors}"))
}

/// Seed the catalog from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an article names
/// an unknown category, or a database operation fails.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog = Catalog::parse(&content)?;
    info!(
        categories = catalog.categories.len(),
        expeditions = catalog.expeditions.len(),
        articles = catalog.articles.len(),
        "Catalog validated"
    );

    let pool = connect().await?;
    let summary = seed(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!("  Records inserted: {}", summary.inserted);
    info!("  Records skipped (already exist): {}", summary.skipped);
    Ok(())
}

async fn seed(pool: &PgPool, catalog: &Catalog) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();

    let categories = CategoryRepository::new(pool);
    for category in &catalog.categories {
        if categories.get_by_code(category.code.trim()).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        categories.create(category).await?;
        summary.inserted += 1;
    }

    let expeditions = ExpeditionRepository::new(pool);
    for expedition in &catalog.expeditions {
        if expeditions.get_by_name(&expedition.name).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        expeditions.create(expedition).await?;
        summary.inserted += 1;
    }

    let articles = ArticleRepository::new(pool);
    for article in &catalog.articles {
        if articles.get_by_code(article.code.trim()).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        let Some(category) = categories.get_by_code(article.category.trim()).await? else {
            warn!(article = %article.code, category = %article.category, "Unknown category");
            return Err(CommandError::InvalidEntry(format!(
                "article '{}': category '{}' does not exist",
                article.code, article.category
            )));
        };
        articles.create(&article.to_new_article(category.id)).await?;
        summary.inserted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
categories:
  - code: BEV
    description: Beverages
expeditions:
  - name: Colissimo
    cost: "4.95"
articles:
  - code: TEA-01
    designation: Green tea
    quantity: 20
    price: "4.50"
    discount: "10"
    category: BEV
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.expeditions[0].name, "Colissimo");
        assert_eq!(catalog.articles[0].category, "BEV");
        assert_eq!(catalog.articles[0].quantity, 20);
    }

    #[test]
    fn test_sections_are_optional() {
        let catalog = Catalog::parse("categories: []\n").unwrap();
        assert!(catalog.articles.is_empty());
        assert!(catalog.expeditions.is_empty());
    }

    #[test]
    fn test_invalid_entry_is_reported_by_name() {
        let err = Catalog::parse(
            r#"
articles:
  - code: MUG-01
    designation: Mug
    quantity: -3
    price: "8.00"
    category: KITCHEN
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("article 'MUG-01'"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            Catalog::parse("products: []\n"),
            Err(CommandError::Yaml(_))
        ));
    }
}
