//! End-to-end checkout reconciliation: a priced checkout produces a payment
//! request, the processor reports back, and orders appear.
//!
//! Runs entirely in process: the in-memory store stands in for `PostgreSQL`
//! and a wiremock server stands in for the processor's verification endpoint.

#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;
use url::Url;
use wiremock::MockServer;

use peoplecart_core::{
    CategoryId, PaymentStatus, Product, ProductId, SealError, UserId, parse_client_cart,
};
use peoplecart_integration_tests::{
    RECEIVER, VERIFY_PATH, mock_processor, notification_body, receiver, seeded_store, signer,
};
use peoplecart_storefront::db::MemoryStore;
use peoplecart_storefront::services::listener::RejectReason;
use peoplecart_storefront::services::{
    CheckoutUrls, IpnVerifier, ListenerOutcome, PaymentListener, PaymentRequest, compute_cart,
};

const STORE_NAME: &str = "PeopleCart";

fn verifier_for(server: &MockServer) -> IpnVerifier {
    let url = Url::parse(&format!("{}{VERIFY_PATH}", server.uri())).unwrap();
    IpnVerifier::new(url).unwrap()
}

/// Price `cart` for account 7 and build the outgoing payment request.
async fn checkout(store: &MemoryStore, cart: &str) -> PaymentRequest {
    let lines = parse_client_cart(cart).unwrap();
    let priced = compute_cart(store, &lines).await.unwrap().unwrap();
    let urls = CheckoutUrls::from_base("https://shop.peoplecart.test").unwrap();
    PaymentRequest::build(
        UserId::new(7),
        &lines,
        &priced,
        &signer(),
        &receiver(),
        STORE_NAME,
        &urls,
    )
    .unwrap()
}

/// The notification the processor sends once `request` is paid.
fn completed(txn_id: &str, request: &PaymentRequest) -> Vec<u8> {
    notification_body(&[
        ("txn_id", txn_id),
        ("payment_status", "Completed"),
        ("custom", &request.custom),
        ("receiver_email", RECEIVER),
        ("payer_email", "buyer@example.com"),
        ("mc_gross", &request.amount),
        ("mc_currency", "USD"),
        ("address_street", "1 Monroeville Rd"),
        ("contact_phone", "555-0100"),
    ])
}

#[tokio::test]
async fn test_paid_checkout_becomes_orders() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":2},{"id":999,"quantity":1}]"#).await;

    assert_eq!(request.amount, "32.98");
    assert_eq!(request.business, RECEIVER);
    assert_eq!(request.notify_url, "https://shop.peoplecart.test/payments/notify");

    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let outcome = listener.handle(&completed("TX100", &request)).await;
    let ListenerOutcome::Materialized(report) = outcome else {
        panic!("expected materialized, got {outcome:?}");
    };
    assert_eq!(report.orders_created, 1);
    assert_eq!(report.lines_skipped, 1);

    let orders = store.orders();
    assert_eq!(orders.len(), 1);
    let order = orders.first().unwrap();
    assert_eq!(order.product_id, ProductId::new(1));
    assert_eq!(order.quantity, 2);
    assert_eq!(order.unit_price, dec!(14.99));
    assert_eq!(order.address, "1 Monroeville Rd");
    assert_eq!(order.phone, "555-0100");
    assert!(order.status);

    let customers = store.customers();
    assert_eq!(customers.len(), 1);
    let customer = customers.first().unwrap();
    assert_eq!(customer.email.as_str(), "scout@example.com");
    assert_eq!(customer.first_name, "Jean Louise");
    assert_eq!(customer.id, report.customer_id);

    let record = store.notification("TX100").unwrap();
    assert_eq!(record.outcome, "materialized");
    assert_eq!(record.orders_created, 1);
}

#[tokio::test]
async fn test_redelivered_notification_creates_nothing_new() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":3,"quantity":1}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);
    let body = completed("TX200", &request);

    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Materialized(_)
    ));
    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Duplicate
    ));

    assert_eq!(store.orders().len(), 1);
    assert_eq!(store.customers().len(), 1);
}

#[tokio::test]
async fn test_pending_payment_is_rejected_without_side_effects() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let body = notification_body(&[
        ("txn_id", "TX300"),
        ("payment_status", "Pending"),
        ("custom", &request.custom),
        ("receiver_email", RECEIVER),
    ]);

    let outcome = listener.handle(&body).await;
    assert!(matches!(
        outcome,
        ListenerOutcome::Rejected(RejectReason::NotCompleted(PaymentStatus::Pending))
    ));
    assert!(store.orders().is_empty());
    assert!(store.customers().is_empty());
    assert!(store.notification("TX300").is_none());
}

#[tokio::test]
async fn test_notification_disowned_by_processor_is_rejected() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1}]"#).await;
    let server = mock_processor("INVALID").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let outcome = listener.handle(&completed("TX400", &request)).await;
    assert!(matches!(
        outcome,
        ListenerOutcome::Rejected(RejectReason::Invalid)
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_payment_to_another_merchant_is_rejected() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let body = notification_body(&[
        ("txn_id", "TX500"),
        ("payment_status", "Completed"),
        ("custom", &request.custom),
        ("receiver_email", "someone-else@example.com"),
    ]);

    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Rejected(RejectReason::ReceiverMismatch(_))
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_unsealed_custom_data_is_rejected() {
    let store = seeded_store();
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let body = notification_body(&[
        ("txn_id", "TX600"),
        ("payment_status", "Completed"),
        ("custom", r#"{"user_id":7,"cart_items":[{"id":1,"quantity":1}]}"#),
        ("receiver_email", RECEIVER),
        ("mc_gross", "16.49"),
        ("mc_currency", "USD"),
    ]);

    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Rejected(RejectReason::Forged(SealError::Unsealed))
    ));
    assert!(store.orders().is_empty());
    assert!(store.customers().is_empty());
    assert!(store.notification("TX600").is_none());
}

#[tokio::test]
async fn test_buyer_edited_quantity_is_rejected() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let mut edited = request.clone();
    edited.custom = request
        .custom
        .replace(r#""quantity":1"#, r#""quantity":50"#);

    assert!(matches!(
        listener.handle(&completed("TX610", &edited)).await,
        ListenerOutcome::Rejected(RejectReason::Forged(SealError::BadSignature))
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_buyer_lowered_amount_is_rejected() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":50}]"#).await;
    assert_eq!(request.amount, "824.45");
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let mut underpaid = request.clone();
    underpaid.amount = "0.01".to_owned();

    assert!(matches!(
        listener.handle(&completed("TX620", &underpaid)).await,
        ListenerOutcome::Rejected(RejectReason::Underpaid { .. })
    ));
    assert!(store.orders().is_empty());
    assert!(store.notification("TX620").is_none());
}

#[tokio::test]
async fn test_failure_mid_batch_does_not_duplicate_orders_on_redelivery() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1},{"id":2,"quantity":1}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);
    let body = completed("TX650", &request);

    store.fail_order_write(2);
    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Failed(_)
    ));
    assert!(matches!(
        listener.handle(&body).await,
        ListenerOutcome::Materialized(_)
    ));

    let products: Vec<ProductId> = store.orders().iter().map(|o| o.product_id).collect();
    assert_eq!(products, [ProductId::new(1), ProductId::new(2)]);
}

#[tokio::test]
async fn test_hostile_notification_does_not_block_the_next() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":2,"quantity":3}]"#).await;
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let hostile = listener.handle(b"\xff\xfe%%%garbage").await;
    assert!(matches!(hostile, ListenerOutcome::Rejected(_)));

    let outcome = listener.handle(&completed("TX700", &request)).await;
    assert_eq!(outcome.orders_created(), 1);

    let order = store.orders().into_iter().next().unwrap();
    assert_eq!(order.quantity, 3);
    assert_eq!(order.unit_price, dec!(15.00));
}

#[tokio::test]
async fn test_repeat_buyer_keeps_one_customer() {
    let store = seeded_store();
    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let first = checkout(&store, r#"[{"id":1,"quantity":1}]"#).await;
    let second = checkout(&store, r#"[{"id":3,"quantity":1}]"#).await;

    listener.handle(&completed("TX800", &first)).await;
    listener.handle(&completed("TX801", &second)).await;

    assert_eq!(store.customers().len(), 1);
    assert_eq!(store.orders().len(), 2);
}

#[tokio::test]
async fn test_catalog_changes_after_checkout_use_live_data() {
    let store = seeded_store();
    let request = checkout(&store, r#"[{"id":1,"quantity":1},{"id":3,"quantity":1}]"#).await;
    assert_eq!(request.amount, "26.94");

    // Book 3 disappears and book 1 is marked down before payment clears.
    store.remove_product(ProductId::new(3));
    store.insert_product(Product {
        id: ProductId::new(1),
        name: "To Kill a Mockingbird".to_owned(),
        price: dec!(14.99),
        is_sale: true,
        sale_price: Some(dec!(9.99)),
        category_id: CategoryId::new(1),
        description: String::new(),
        image: None,
    });

    let server = mock_processor("VERIFIED").await;
    let verifier = verifier_for(&server);
    let (signer, receiver) = (signer(), receiver());
    let listener = PaymentListener::new(&store, &verifier, &signer, &receiver);

    let ListenerOutcome::Materialized(report) =
        listener.handle(&completed("TX900", &request)).await
    else {
        panic!("expected materialized");
    };
    assert_eq!(report.orders_created, 1);
    assert_eq!(report.lines_skipped, 1);

    let order = store.orders().into_iter().next().unwrap();
    assert_eq!(order.unit_price, dec!(9.99));
}
