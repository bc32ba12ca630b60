//! Catalog route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::models::product::Product;
use crate::routes::PageContext;
use crate::state::AppState;

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub old_price: Option<String>,
    pub rating: Option<f64>,
    pub features: Vec<String>,
    pub image: String,
    pub category: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            price: product.price.to_string(),
            old_price: product.old_price.map(|p| p.to_string()),
            rating: product.rating,
            features: product.features.clone(),
            image: product.web_image_path(),
            category: product.category.clone(),
        }
    }
}

/// A category heading with its products, in display order.
pub struct CategorySection {
    pub name: String,
    pub products: Vec<ProductCard>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub carousel: Vec<ProductCard>,
    pub categories: Vec<String>,
    pub sections: Vec<CategorySection>,
    pub selected_category: Option<String>,
    pub query: Option<String>,
}

/// Group an ordered-by-category product list into sections.
fn group_by_category(products: &[Product]) -> Vec<CategorySection> {
    let mut sections: Vec<CategorySection> = Vec::new();
    for product in products {
        let card = ProductCard::from(product);
        match sections.last_mut() {
            Some(section) if section.name == product.category => section.products.push(card),
            _ => sections.push(CategorySection {
                name: product.category.clone(),
                products: vec![card],
            }),
        }
    }
    sections
}

/// Display the catalog, optionally filtered by category or search term.
///
/// A non-empty search term suppresses the category filter. An unknown
/// category yields an empty result set rather than an error.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CatalogQuery>,
) -> Result<HomeTemplate, AppError> {
    let repo = ProductRepository::new(state.pool());

    let categories = repo.categories().await?;
    let query = params
        .q
        .map(|q| q.trim().to_owned())
        .filter(|q| !q.is_empty());
    let selected_category = if query.is_some() {
        None
    } else {
        params.category.filter(|c| !c.is_empty())
    };

    let products = if let Some(q) = &query {
        repo.search(q).await?
    } else if let Some(category) = &selected_category {
        if categories.contains(category) {
            repo.list_by_category(category).await?
        } else {
            Vec::new()
        }
    } else {
        repo.list().await?
    };

    // The carousel strip always shows the first few catalog products,
    // independent of any filter.
    let carousel: Vec<ProductCard> = repo
        .list()
        .await?
        .iter()
        .take(3)
        .map(ProductCard::from)
        .collect();

    let sections = group_by_category(&products);
    let ctx = PageContext::load(&session).await?;

    Ok(HomeTemplate {
        ctx,
        carousel,
        categories,
        sections,
        selected_category,
        query,
    })
}
