//! Product repository for database operations.
//!
//! The feature list is stored as a single comma-delimited column (SQLite has
//! no array type); the delimiter never leaves this module — callers see an
//! ordered `Vec<String>`.

use sqlx::SqlitePool;

use soko_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::Product;

/// Delimiter used to pack the feature list into one column.
const FEATURE_DELIMITER: char = ',';

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price_cents: i64,
    old_price_cents: Option<i64>,
    rating: Option<f64>,
    features: String,
    image: String,
    category: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: Price::from_cents(row.price_cents),
            old_price: row.old_price_cents.map(Price::from_cents),
            rating: row.rating,
            features: unpack_features(&row.features),
            image: row.image,
            category: row.category,
        }
    }
}

/// Fields accepted when creating or updating a product.
///
/// This is the complete allow-list; nothing else on the row is writable
/// through the repository.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub rating: Option<f64>,
    pub features: Vec<String>,
    pub image: String,
    pub category: String,
}

fn pack_features(features: &[String]) -> String {
    features.join(&FEATURE_DELIMITER.to_string())
}

fn unpack_features(packed: &str) -> Vec<String> {
    packed
        .split(FEATURE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

const SELECT_COLUMNS: &str =
    "id, name, price_cents, old_price_cents, rating, features, image, category";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List the whole catalog, ordered by category then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products ORDER BY category, name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// List products in a single category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE category = ? ORDER BY category, name"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Search products by a case-insensitive substring of the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products \
             WHERE name LIKE '%' || ? || '%' ORDER BY category, name"
        ))
        .bind(query)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// The distinct set of categories currently present, sorted.
    ///
    /// A category disappears from this list as soon as its last product is
    /// deleted; there is no separate category table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(self.pool)
                .await?;

        Ok(categories)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, price_cents, old_price_cents, rating, features, image, category) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(product.price.as_cents())
        .bind(product.old_price.map(|p| p.as_cents()))
        .bind(product.rating)
        .bind(pack_features(&product.features))
        .bind(&product.image)
        .bind(&product.category)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a product in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(&self, id: ProductId, product: &NewProduct) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products \
             SET name = ?, price_cents = ?, old_price_cents = ?, rating = ?, \
                 features = ?, image = ?, category = ? \
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.price.as_cents())
        .bind(product.old_price.map(|p| p.as_cents()))
        .bind(product.rating)
        .bind(pack_features(&product.features))
        .bind(&product.image)
        .bind(&product.category)
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a product by ID.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_roundtrip() {
        let features = vec!["Intel Core i7".to_owned(), "16GB RAM".to_owned()];
        assert_eq!(unpack_features(&pack_features(&features)), features);
    }

    #[test]
    fn test_unpack_skips_empty_segments() {
        assert_eq!(unpack_features(""), Vec::<String>::new());
        assert_eq!(unpack_features("a,,b,"), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_unpack_trims_whitespace() {
        assert_eq!(
            unpack_features("Dual Band, 4 Antennas"),
            vec!["Dual Band".to_owned(), "4 Antennas".to_owned()]
        );
    }
}
