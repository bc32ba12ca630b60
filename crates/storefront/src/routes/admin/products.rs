//! Admin CRUD handlers for catalog products.
//!
//! Bindable fields: name, price, old_price, rating, features (one per
//! line), image, category. Nothing else.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use soko_core::{Price, ProductId};

use crate::db::{NewProduct, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::{Flash, RequireAdmin};
use crate::models::product::Product;
use crate::routes::PageContext;
use crate::state::AppState;

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductRow>,
}

/// One row of the admin product table.
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub category: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            price: product.price.to_string(),
            category: product.category.clone(),
        }
    }
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: String,
    pub form: ProductFormView,
}

/// Pre-filled form values.
#[derive(Default)]
pub struct ProductFormView {
    pub name: String,
    pub price: String,
    pub old_price: String,
    pub rating: String,
    pub features: String,
    pub image: String,
    pub category: String,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            old_price: product
                .old_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            rating: product.rating.map(|r| r.to_string()).unwrap_or_default(),
            features: product.features.join("\n"),
            image: product.image.clone(),
            category: product.category.clone(),
        }
    }
}

/// Product form data (the complete allow-list).
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub old_price: Option<String>,
    pub rating: Option<String>,
    pub features: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

/// Validate the submitted form into a repository row.
fn parse_form(form: ProductForm) -> Result<NewProduct, String> {
    let name = require(form.name, "Name")?;
    let image = require(form.image, "Image")?;
    let category = require(form.category, "Category")?;

    let price = Price::parse(&require(form.price, "Price")?)
        .map_err(|e| format!("Price: {e}"))?;

    let old_price = match form.old_price.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Price::parse(raw).map_err(|e| format!("Old price: {e}"))?),
    };

    let rating = match form.rating.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<f64>()
                .map_err(|_| "Rating must be a number".to_owned())?,
        ),
    };

    let features = form
        .features
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(NewProduct {
        name,
        price,
        old_price,
        rating,
        features,
        image,
        category,
    })
}

fn require(value: Option<String>, field: &str) -> Result<String, String> {
    let value = value.unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(value.to_owned())
}

/// List all products.
#[instrument(skip(state, session))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<ProductsTemplate, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    let ctx = PageContext::load(&session).await?;

    Ok(ProductsTemplate {
        ctx,
        products: products.iter().map(ProductRow::from).collect(),
    })
}

/// Display the new-product form.
pub async fn new_form(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<ProductFormTemplate, AppError> {
    let ctx = PageContext::load(&session).await?;
    Ok(ProductFormTemplate {
        ctx,
        title: "New product".to_owned(),
        action: "/admin/products".to_owned(),
        form: ProductFormView::default(),
    })
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    let new_product = match parse_form(form) {
        Ok(p) => p,
        Err(message) => {
            flash.danger(message).await?;
            return Ok(Redirect::to("/admin/products/new"));
        }
    };

    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;
    flash
        .success(format!("Product '{}' created.", product.name))
        .await?;

    Ok(Redirect::to("/admin/products"))
}

/// Display the edit form for a product.
#[instrument(skip(state, session))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(product) = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
    else {
        Flash::new(&session).warning("Product not found.").await?;
        return Ok(Redirect::to("/admin/products").into_response());
    };

    let ctx = PageContext::load(&session).await?;
    Ok(ProductFormTemplate {
        ctx,
        title: format!("Edit product #{id}"),
        action: format!("/admin/products/{id}"),
        form: ProductFormView::from(&product),
    }
    .into_response())
}

/// Update a product.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    let new_product = match parse_form(form) {
        Ok(p) => p,
        Err(message) => {
            flash.danger(message).await?;
            return Ok(Redirect::to(&format!("/admin/products/{id}/edit")));
        }
    };

    match ProductRepository::new(state.pool())
        .update(ProductId::new(id), &new_product)
        .await
    {
        Ok(()) => {
            flash.success("Product updated.").await?;
            Ok(Redirect::to("/admin/products"))
        }
        Err(RepositoryError::NotFound) => {
            flash.warning("Product not found.").await?;
            Ok(Redirect::to("/admin/products"))
        }
        Err(other) => Err(other.into()),
    }
}

/// Delete a product.
///
/// Carts referencing it keep their entry; the cart view just skips it.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    if ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?
    {
        flash.success("Product deleted.").await?;
    } else {
        flash.warning("Product not found.").await?;
    }

    Ok(Redirect::to("/admin/products"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> ProductForm {
        ProductForm {
            name: Some("Tablet X".to_owned()),
            price: Some("30000".to_owned()),
            old_price: Some("35000".to_owned()),
            rating: Some("4.5".to_owned()),
            features: Some("Great screen\n\n  Long battery  \n".to_owned()),
            image: Some("tablet.jpg".to_owned()),
            category: Some("Tablets".to_owned()),
        }
    }

    #[test]
    fn test_parse_form_complete() {
        let parsed = parse_form(full_form()).expect("form should parse");
        assert_eq!(parsed.name, "Tablet X");
        assert_eq!(parsed.price, Price::from_shillings(30_000));
        assert_eq!(parsed.old_price, Some(Price::from_shillings(35_000)));
        assert_eq!(parsed.rating, Some(4.5));
        assert_eq!(parsed.features, vec!["Great screen", "Long battery"]);
    }

    #[test]
    fn test_parse_form_optional_fields_blank() {
        let mut form = full_form();
        form.old_price = Some(String::new());
        form.rating = None;
        form.features = None;

        let parsed = parse_form(form).expect("form should parse");
        assert_eq!(parsed.old_price, None);
        assert_eq!(parsed.rating, None);
        assert!(parsed.features.is_empty());
    }

    #[test]
    fn test_parse_form_rejects_bad_price() {
        let mut form = full_form();
        form.price = Some("not-a-price".to_owned());
        assert!(parse_form(form).is_err());
    }

    #[test]
    fn test_parse_form_rejects_missing_name() {
        let mut form = full_form();
        form.name = Some("   ".to_owned());
        assert!(parse_form(form).is_err());
    }
}
