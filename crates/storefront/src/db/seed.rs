//! First-run seeding: the fixed admin account and the initial catalog.
//!
//! Seeding is idempotent — the admin account is only created when missing
//! and products only when the table is empty.

use sqlx::SqlitePool;
use thiserror::Error;

use super::{NewProduct, ProductRepository, RepositoryError, UserRepository};
use crate::services::auth::{self, AuthError};

/// Username of the seeded admin account.
pub const ADMIN_USERNAME: &str = "admin";

/// Default password of the seeded admin account.
const ADMIN_PASSWORD: &str = "admin";

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

struct SeedProduct {
    name: &'static str,
    price: i64,
    old_price: Option<i64>,
    rating: Option<f64>,
    features: &'static [&'static str],
    image: &'static str,
    category: &'static str,
}

const INITIAL_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "HP ProBook 445 14\" G11 Notebook",
        price: 85_000,
        old_price: Some(95_000),
        rating: Some(4.5),
        features: &["AMD R5-7535U", "8GB RAM", "512GB SSD"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=HP+ProBook",
        category: "Laptops",
    },
    SeedProduct {
        name: "HP EliteBook 630 G10 Core i7",
        price: 95_000,
        old_price: Some(110_000),
        rating: Some(4.8),
        features: &["Intel Core i7", "16GB RAM", "512GB SSD"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=HP+EliteBook",
        category: "Laptops",
    },
    SeedProduct {
        name: "Lenovo V14 Gen2 14\" Intel",
        price: 75_000,
        old_price: Some(82_000),
        rating: Some(4.2),
        features: &["Intel Core i5", "8GB RAM", "256GB SSD"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Lenovo+V14",
        category: "Laptops",
    },
    SeedProduct {
        name: "Apple MacBook Air M2",
        price: 150_000,
        old_price: Some(165_000),
        rating: Some(4.9),
        features: &["Apple M2 Chip", "8GB RAM", "256GB SSD", "Liquid Retina"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=MacBook+Air",
        category: "Laptops",
    },
    SeedProduct {
        name: "Asus ROG Zephyrus G14",
        price: 190_000,
        old_price: Some(210_000),
        rating: Some(4.8),
        features: &["AMD Ryzen 9", "16GB RAM", "1TB SSD", "RTX 3060"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Asus+ROG",
        category: "Laptops",
    },
    SeedProduct {
        name: "Gaming PC Pro",
        price: 120_000,
        old_price: Some(135_000),
        rating: Some(4.9),
        features: &["Ryzen 7", "32GB RAM", "1TB NVMe SSD", "RTX 4060"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Gaming+PC",
        category: "Desktops",
    },
    SeedProduct {
        name: "Apple iMac 24\"",
        price: 180_000,
        old_price: Some(195_000),
        rating: Some(4.8),
        features: &["Apple M1 Chip", "8GB RAM", "256GB SSD", "4.5K Retina"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=iMac+24",
        category: "Desktops",
    },
    SeedProduct {
        name: "Intel NUC Mini PC",
        price: 55_000,
        old_price: Some(62_000),
        rating: Some(4.7),
        features: &["Intel Core i7", "16GB RAM", "512GB NVMe", "Ultra Compact"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Intel+NUC",
        category: "Desktops",
    },
    SeedProduct {
        name: "TP-Link Archer C6 WiFi Router",
        price: 5_000,
        old_price: Some(6_500),
        rating: Some(4.6),
        features: &["Dual Band", "4 Antennas", "Gigabit Ports"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Archer+C6",
        category: "Accessories",
    },
    SeedProduct {
        name: "Logitech MX Master 3S Mouse",
        price: 12_000,
        old_price: Some(15_000),
        rating: Some(4.9),
        features: &["Ergonomic Design", "8K DPI Sensor", "Quiet Clicks"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=MX+Master",
        category: "Accessories",
    },
    SeedProduct {
        name: "Keychron K2 Mechanical Keyboard",
        price: 9_500,
        old_price: Some(11_000),
        rating: Some(4.8),
        features: &["Wireless/Wired", "Gateron Switches", "Mac & Windows"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Keychron+K2",
        category: "Accessories",
    },
    SeedProduct {
        name: "Sony WH-1000XM5 Headphones",
        price: 45_000,
        old_price: Some(52_000),
        rating: Some(4.9),
        features: &["Noise Cancelling", "Wireless", "30-Hour Battery"],
        image: "https://placehold.co/400x300/f4f4f4/333?text=Sony+XM5",
        category: "Accessories",
    },
];

impl From<&SeedProduct> for NewProduct {
    fn from(seed: &SeedProduct) -> Self {
        Self {
            name: seed.name.to_owned(),
            price: soko_core::Price::from_shillings(seed.price),
            old_price: seed.old_price.map(soko_core::Price::from_shillings),
            rating: seed.rating,
            features: seed.features.iter().map(|&f| f.to_owned()).collect(),
            image: seed.image.to_owned(),
            category: seed.category.to_owned(),
        }
    }
}

/// Seed the database with the fixed admin account and initial catalog.
///
/// # Errors
///
/// Returns `SeedError` if hashing or a database operation fails.
pub async fn run(pool: &SqlitePool) -> Result<(), SeedError> {
    let users = UserRepository::new(pool);
    if users.get_by_username(ADMIN_USERNAME).await?.is_none() {
        let password_hash = auth::hash_password(ADMIN_PASSWORD)?;
        users.create(ADMIN_USERNAME, &password_hash, true).await?;
        tracing::warn!(
            username = ADMIN_USERNAME,
            "Created default admin account; change its password before going live"
        );
    }

    let products = ProductRepository::new(pool);
    if products.count().await? == 0 {
        for seed in INITIAL_PRODUCTS {
            products.create(&NewProduct::from(seed)).await?;
        }
        tracing::info!(count = INITIAL_PRODUCTS.len(), "Seeded initial catalog");
    }

    Ok(())
}
