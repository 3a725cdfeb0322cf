//! Errors returned by catalog, cart, and checkout handlers.
//!
//! Store failures and broken checkout intents become a bare 500 and a Sentry
//! event. Missing books and unreadable cart bodies map to 404 and 400 with
//! their message. Sign-in failures are answered by the auth extractor, and
//! `/payments/notify` never returns an `AppError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;

/// Error type for storefront handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog or account lookup failed in the store.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// No such product or category.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cart body that cannot be read.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Checkout could not build the payment request.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Store and intent details stay in Sentry.
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in buyer to Sentry events from this checkout.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Record a checkout step, such as the payment request being built, as a
/// Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
