//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use peoplecart_core::{IntentSigner, SealError};

use crate::config::StorefrontConfig;
use crate::db::PgStore;
use crate::services::checkout::CheckoutUrls;
use crate::services::payments::{IpnVerifier, VerifyError};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("payment verifier: {0}")]
    Verifier(#[from] VerifyError),
    #[error("intent signer: {0}")]
    IntentKey(#[from] SealError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: PgStore,
    verifier: IpnVerifier,
    intent_signer: IntentSigner,
    checkout_urls: CheckoutUrls,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot produce absolute checkout
    /// URLs, the verifier's HTTP client cannot be built, or the intent key
    /// is unusable.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let checkout_urls = CheckoutUrls::from_base(&config.base_url)?;
        let verifier = IpnVerifier::new(config.payment.verify_url.clone())?;
        let intent_signer = IntentSigner::new(
            config.payment.intent_secret.expose_secret().as_bytes(),
            config.payment.currency,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store: PgStore::new(pool),
                verifier,
                intent_signer,
                checkout_urls,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database-backed store.
    #[must_use]
    pub fn store(&self) -> &PgStore {
        &self.inner.store
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }

    /// Get a reference to the payment notification verifier.
    #[must_use]
    pub fn verifier(&self) -> &IpnVerifier {
        &self.inner.verifier
    }

    /// Get the signer that seals and opens checkout intents.
    #[must_use]
    pub fn intent_signer(&self) -> &IntentSigner {
        &self.inner.intent_signer
    }

    /// Get the absolute notify/return/cancel URLs.
    #[must_use]
    pub fn checkout_urls(&self) -> &CheckoutUrls {
        &self.inner.checkout_urls
    }
}
