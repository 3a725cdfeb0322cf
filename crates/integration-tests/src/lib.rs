//! Integration tests for PeopleCart.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process pipeline and router tests (no database needed)
//! cargo test -p peoplecart-integration-tests
//!
//! # Live tests against a running storefront
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p peoplecart-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `checkout_pipeline` - checkout -> notification -> orders, in memory
//! - `storefront_http` - router-level tests and live server smoke tests
//!
//! Shared fixtures live here.

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peoplecart_core::{
    Category, CategoryId, CurrencyCode, Email, IntentSigner, Product, ProductId, UserId,
};
use peoplecart_storefront::db::MemoryStore;
use peoplecart_storefront::models::User;

/// Merchant account used throughout the tests.
pub const RECEIVER: &str = "merchant@peoplecart.test";

/// Key the checkout intent is sealed with.
pub const INTENT_SECRET: &str = "Wc5Nq8Tz1Hv4Lm7Xb2Rk9Gd6Jp3Fs0Ya";

/// Path the mock processor serves verification on.
pub const VERIFY_PATH: &str = "/cgi-bin/webscr";

/// Parse the merchant account.
///
/// # Panics
///
/// Panics if [`RECEIVER`] is not a valid address.
#[must_use]
pub fn receiver() -> Email {
    Email::parse(RECEIVER).expect("fixture receiver is a valid address")
}

/// The intent signer keyed with [`INTENT_SECRET`].
///
/// # Panics
///
/// Panics if the key is rejected.
#[must_use]
pub fn signer() -> IntentSigner {
    IntentSigner::new(INTENT_SECRET.as_bytes(), CurrencyCode::USD)
        .expect("fixture intent key is usable")
}

/// A store holding one category, a few books, and one account.
///
/// Books: 1 at 14.99, 2 at 20.00 on sale for 15.00, 3 at 9.50.
/// Account 7 is `scout@example.com`.
///
/// # Panics
///
/// Panics if the fixture account email is invalid.
#[must_use]
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_category(Category {
        id: CategoryId::new(1),
        name: "Fiction".to_owned(),
    });

    for (id, name, price, sale) in [
        (1, "To Kill a Mockingbird", Decimal::new(1499, 2), None),
        (2, "1984", Decimal::new(2000, 2), Some(Decimal::new(1500, 2))),
        (3, "The Catcher in the Rye", Decimal::new(950, 2), None),
    ] {
        store.insert_product(Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            price,
            is_sale: sale.is_some(),
            sale_price: sale,
            category_id: CategoryId::new(1),
            description: String::new(),
            image: None,
        });
    }

    store.insert_user(User {
        id: UserId::new(7),
        username: "scout".to_owned(),
        email: Email::parse("scout@example.com").expect("fixture email is valid"),
        first_name: "Jean Louise".to_owned(),
        last_name: "Finch".to_owned(),
    });

    store
}

/// Start a mock processor that answers every verification with `answer`.
pub async fn mock_processor(answer: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VERIFY_PATH))
        .and(body_string_contains("cmd=_notify-validate&"))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer))
        .mount(&server)
        .await;
    server
}

/// Form-encode a notification body.
#[must_use]
pub fn notification_body(fields: &[(&str, &str)]) -> Vec<u8> {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
        .into_bytes()
}
