//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::Flash;
use crate::routes::PageContext;

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub ctx: PageContext,
}

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Display the contact page.
pub async fn page(session: Session) -> Result<ContactTemplate, AppError> {
    let ctx = PageContext::load(&session).await?;
    Ok(ContactTemplate { ctx })
}

/// Handle contact form submission.
#[instrument(skip_all)]
pub async fn submit(session: Session, Form(form): Form<ContactForm>) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    let name = form.name.unwrap_or_default();
    let email = form.email.unwrap_or_default();
    let message = form.message.unwrap_or_default();

    if name.trim().is_empty() || email.trim().is_empty() || message.trim().is_empty() {
        flash.warning("All fields are required.").await?;
        return Ok(Redirect::to("/contact"));
    }

    tracing::info!(
        name = %name.trim(),
        email = %email.trim(),
        "Contact form message received"
    );
    flash
        .success("Thanks for reaching out. We'll get back to you.")
        .await?;

    Ok(Redirect::to("/contact"))
}
