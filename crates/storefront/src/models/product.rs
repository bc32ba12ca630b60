//! Product domain type.

use soko_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current selling price.
    pub price: Price,
    /// Former price, shown struck through as a discount.
    pub old_price: Option<Price>,
    /// Star rating out of 5.
    pub rating: Option<f64>,
    /// Ordered feature bullet points.
    pub features: Vec<String>,
    /// Image reference: a URL or a path under `/static`.
    pub image: String,
    /// Free-form category label. Categories are derived by distinct-value
    /// query, not a foreign key.
    pub category: String,
}

impl Product {
    /// The image path with forward slashes, safe to put in a URL.
    #[must_use]
    pub fn web_image_path(&self) -> String {
        self.image.replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_image_path_normalizes_backslashes() {
        let product = Product {
            id: ProductId::new(1),
            name: "Router".to_owned(),
            price: Price::from_shillings(5_000),
            old_price: None,
            rating: None,
            features: vec![],
            image: "images\\routers\\archer.webp".to_owned(),
            category: "Accessories".to_owned(),
        };

        assert_eq!(product.web_image_path(), "images/routers/archer.webp");
    }
}
