//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront, reachable by the payment processor
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `PAYMENT_RECEIVER_EMAIL` - Merchant account that receives payments
//! - `PAYMENT_INTENT_SECRET` - Key sealing the checkout intent sent through the processor (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYMENT_CHECKOUT_URL` - Processor web checkout URL (default: sandbox)
//! - `PAYMENT_VERIFY_URL` - Processor notification verification URL (default: sandbox)
//! - `PAYMENT_CURRENCY` - Settlement currency (default: USD, the only supported value)
//! - `STORE_NAME` - Shown on pages and in payment descriptions (default: `PeopleCart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use peoplecart_core::{CurrencyCode, Email};

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_CHECKOUT_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";
const DEFAULT_VERIFY_URL: &str = "https://ipnpb.sandbox.paypal.com/cgi-bin/webscr";

/// Substrings that mark a secret as copied from documentation.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "placeholder",
    "example",
    "replace",
    "your-",
    "secret",
    "password",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Payment processor settings
    pub payment: PaymentConfig,
    /// Store name shown to buyers
    pub store_name: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Payment processor configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Merchant account payments are addressed to
    pub receiver_email: Email,
    /// Where the checkout form is posted
    pub checkout_url: Url,
    /// Where notifications are posted back for verification
    pub verify_url: Url,
    /// Settlement currency
    pub currency: CurrencyCode,
    /// Key sealing the checkout intent
    pub intent_secret: SecretString,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if a secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(&EnvVars::Process)
    }

    fn from_vars(vars: &EnvVars) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("STOREFRONT_DATABASE_URL")
            .or_else(|| vars.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = parse_var(vars, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_var(vars, "STOREFRONT_PORT", "3000")?;

        let base_url = vars.required("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let session_secret = SecretString::from(vars.required("STOREFRONT_SESSION_SECRET")?);
        validate_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payment: PaymentConfig::from_vars(vars)?,
            store_name: vars.get_or("STORE_NAME", "PeopleCart"),
            sentry_dsn: vars.get("SENTRY_DSN"),
            sentry_environment: vars.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_var(vars, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_var(vars, "SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_vars(vars: &EnvVars) -> Result<Self, ConfigError> {
        let receiver_email = Email::parse(&vars.required("PAYMENT_RECEIVER_EMAIL")?).map_err(
            |e| ConfigError::InvalidEnvVar("PAYMENT_RECEIVER_EMAIL".to_string(), e.to_string()),
        )?;

        let intent_secret = SecretString::from(vars.required("PAYMENT_INTENT_SECRET")?);
        validate_secret(&intent_secret, "PAYMENT_INTENT_SECRET")?;

        Ok(Self {
            receiver_email,
            intent_secret,
            checkout_url: parse_var(vars, "PAYMENT_CHECKOUT_URL", DEFAULT_CHECKOUT_URL)?,
            verify_url: parse_var(vars, "PAYMENT_VERIFY_URL", DEFAULT_VERIFY_URL)?,
            currency: parse_var(vars, "PAYMENT_CURRENCY", "USD")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Where variables are read from. Tests use a fixed map instead of mutating
/// the process environment.
enum EnvVars {
    Process,
    #[cfg(test)]
    Map(HashMap<&'static str, &'static str>),
}

impl EnvVars {
    /// Get an optional variable. Blank values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            #[cfg(test)]
            Self::Map(map) => map.get(key).map(|v| (*v).to_string()),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse a variable (or its default) with `FromStr`.
fn parse_var<T>(vars: &EnvVars, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    vars.get_or(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a secret is long, not a placeholder, and random enough.
fn validate_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    let insecure = |reason: String| ConfigError::InsecureSecret(var_name.to_string(), reason);

    if value.len() < MIN_SECRET_LENGTH {
        return Err(insecure(format!(
            "must be at least {MIN_SECRET_LENGTH} characters (got {})",
            value.len()
        )));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(insecure(format!(
            "appears to be a placeholder (contains '{pattern}')"
        )));
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        )));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // lengths are far below f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}
