//! Payment notification listener.
//!
//! Each notification is driven through one pass of a small state machine:
//!
//! ```text
//! received ─┬─> rejected      unreadable, not verified, not completed, wrong receiver,
//!           │                 unsealed or forged intent, wrong currency, underpaid
//!           └─> verified ─┬─> duplicate     transaction already claimed
//!                         ├─> discarded     bad intent, empty cart, unknown user
//!                         ├─> materialized  orders written
//!                         └─> failed        store failure, claim released for retry
//! ```
//!
//! The listener never returns an error. Every problem ends in a logged
//! [`ListenerOutcome`] so one hostile or broken notification cannot affect
//! the next one.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{Span, instrument};

use peoplecart_core::{
    CurrencyCode, Email, IntentError, IntentSigner, PaymentStatus, SealError, SealedIntent,
    UserId,
};

use crate::db::{AccountStore, CatalogStore, NotificationLedger, OrderStore, RepositoryError};
use crate::services::materializer::{
    MaterializeError, MaterializeReport, MaterializeRequest, materialize,
};
use crate::services::payments::{
    NotificationError, PaymentEvent, PaymentNotification, PaymentVerifier,
};
use crate::services::pricing::compute_cart;

/// Infrastructure failures that end a notification in [`ListenerOutcome::Failed`].
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// Why a notification was refused before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Body could not be read as a notification.
    Malformed(NotificationError),
    /// The processor could not be asked, or answered nonsense.
    VerificationUnavailable(String),
    /// The processor disowned the notification.
    Invalid,
    /// Genuine, but the payment has not completed.
    NotCompleted(PaymentStatus),
    /// Payment went to a different merchant account.
    ReceiverMismatch(Option<String>),
    /// Custom data was not sealed by this store, or was edited.
    Forged(SealError),
    /// Payment settled in a currency other than the sealed charge's.
    CurrencyMismatch(Option<String>),
    /// Less was paid than the charge sealed at checkout.
    Underpaid {
        expected: Decimal,
        paid: Option<Decimal>,
    },
}

/// Why a genuine, completed payment produced no orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Custom data did not decode to a checkout intent.
    Intent(IntentError),
    /// The intent carried no cart lines.
    EmptyCart,
    /// The intent names an account that does not exist.
    UnknownUser(UserId),
}

/// Terminal state of one notification.
#[derive(Debug)]
pub enum ListenerOutcome {
    Rejected(RejectReason),
    Duplicate,
    Discarded(DiscardReason),
    Materialized(MaterializeReport),
    Failed(ListenerError),
}

impl ListenerOutcome {
    /// Short name stored in the notification ledger.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Duplicate => "duplicate",
            Self::Discarded(_) => "discarded",
            Self::Materialized(_) => "materialized",
            Self::Failed(_) => "failed",
        }
    }

    /// Orders written while reaching this outcome.
    #[must_use]
    pub const fn orders_created(&self) -> usize {
        match self {
            Self::Materialized(report) => report.orders_created,
            _ => 0,
        }
    }
}

/// Processes payment notifications against a store and a verifier.
pub struct PaymentListener<'a, S, V> {
    store: &'a S,
    verifier: &'a V,
    signer: &'a IntentSigner,
    receiver: &'a Email,
}

impl<'a, S, V> PaymentListener<'a, S, V>
where
    S: CatalogStore + AccountStore + OrderStore + NotificationLedger,
    V: PaymentVerifier,
{
    /// Create a listener. `signer` opens the intents sealed at checkout;
    /// `receiver` is the merchant account payments must be addressed to.
    #[must_use]
    pub const fn new(
        store: &'a S,
        verifier: &'a V,
        signer: &'a IntentSigner,
        receiver: &'a Email,
    ) -> Self {
        Self {
            store,
            verifier,
            signer,
            receiver,
        }
    }

    /// Drive one raw notification body to its terminal outcome.
    #[instrument(skip_all, fields(txn_id = tracing::field::Empty))]
    pub async fn handle(&self, raw_body: &[u8]) -> ListenerOutcome {
        let outcome = self.process(raw_body).await;
        log_outcome(&outcome);
        outcome
    }

    async fn process(&self, raw_body: &[u8]) -> ListenerOutcome {
        let notification = match PaymentNotification::from_form(raw_body) {
            Ok(n) => n,
            Err(e) => return ListenerOutcome::Rejected(RejectReason::Malformed(e)),
        };
        Span::current().record("txn_id", notification.txn_id.as_str());

        let verification = match self.verifier.verify(raw_body).await {
            Ok(v) => v,
            Err(e) => {
                return ListenerOutcome::Rejected(RejectReason::VerificationUnavailable(
                    e.to_string(),
                ));
            }
        };

        match PaymentEvent::classify(verification, &notification.payment_status) {
            PaymentEvent::Completed => self.on_completed(&notification).await,
            PaymentEvent::NotCompleted(status) => {
                ListenerOutcome::Rejected(RejectReason::NotCompleted(status))
            }
            PaymentEvent::Invalid => ListenerOutcome::Rejected(RejectReason::Invalid),
        }
    }

    async fn on_completed(&self, notification: &PaymentNotification) -> ListenerOutcome {
        let receiver_ok = notification
            .receiver_email
            .as_deref()
            .and_then(|r| Email::parse(r).ok())
            .is_some_and(|r| r.eq_ignore_case(self.receiver));
        if !receiver_ok {
            return ListenerOutcome::Rejected(RejectReason::ReceiverMismatch(
                notification.receiver_email.clone(),
            ));
        }

        let opened = match self.signer.open(&notification.custom) {
            Ok(sealed) => {
                if let Err(reason) = self.check_payment(&sealed, notification) {
                    return ListenerOutcome::Rejected(reason);
                }
                Ok(sealed)
            }
            Err(SealError::Intent(e)) => Err(e),
            Err(e) => return ListenerOutcome::Rejected(RejectReason::Forged(e)),
        };

        let txn_id = notification.txn_id.as_str();
        match self.store.claim_transaction(txn_id).await {
            Ok(true) => {}
            Ok(false) => return ListenerOutcome::Duplicate,
            Err(e) => return ListenerOutcome::Failed(e.into()),
        }

        let outcome = self.settle(opened, notification).await;

        // A failed materialization wrote no orders, so a redelivery may
        // start over.
        if matches!(outcome, ListenerOutcome::Failed(_)) {
            if let Err(e) = self.store.release_transaction(txn_id).await {
                tracing::error!(error = %e, "Failed to release transaction claim");
            }
        } else {
            let orders = i32::try_from(outcome.orders_created()).unwrap_or(i32::MAX);
            if let Err(e) = self
                .store
                .finish_transaction(txn_id, outcome.as_str(), orders)
                .await
            {
                tracing::error!(error = %e, "Failed to record notification outcome");
            }
        }

        outcome
    }

    /// The processor must report the sealed currency and at least the
    /// sealed charge.
    fn check_payment(
        &self,
        sealed: &SealedIntent,
        notification: &PaymentNotification,
    ) -> Result<(), RejectReason> {
        let currency = notification
            .currency
            .as_deref()
            .and_then(|c| c.parse::<CurrencyCode>().ok());
        if currency != Some(self.signer.currency()) {
            return Err(RejectReason::CurrencyMismatch(notification.currency.clone()));
        }

        match notification.gross {
            Some(paid) if paid >= sealed.charge => Ok(()),
            paid => Err(RejectReason::Underpaid {
                expected: sealed.charge,
                paid,
            }),
        }
    }

    async fn settle(
        &self,
        opened: Result<SealedIntent, IntentError>,
        notification: &PaymentNotification,
    ) -> ListenerOutcome {
        let sealed = match opened {
            Ok(sealed) => sealed,
            Err(e) => return ListenerOutcome::Discarded(DiscardReason::Intent(e)),
        };
        if sealed.intent.lines.is_empty() {
            return ListenerOutcome::Discarded(DiscardReason::EmptyCart);
        }

        let user_id = sealed.intent.user_id;
        let user = match self.store.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return ListenerOutcome::Discarded(DiscardReason::UnknownUser(user_id)),
            Err(e) => return ListenerOutcome::Failed(e.into()),
        };

        self.check_price_drift(&sealed).await;

        let request = MaterializeRequest {
            email: user.email.clone(),
            first_name: user.display_first_name().to_owned(),
            last_name: user.last_name,
            lines: sealed.intent.lines,
            address: notification.address_street.clone(),
            phone: notification.contact_phone.clone(),
        };

        match materialize(self.store, &request).await {
            Ok(report) => ListenerOutcome::Materialized(report),
            Err(e) => ListenerOutcome::Failed(e.into()),
        }
    }

    /// Warn when the catalog changed between checkout and payment. Charges
    /// are never adjusted.
    async fn check_price_drift(&self, sealed: &SealedIntent) {
        let charged = sealed.charge;

        match compute_cart(self.store, &sealed.intent.lines).await {
            Ok(Some(priced)) => {
                let current = priced.total_price().charge_amount();
                if current != charged {
                    tracing::warn!(
                        %charged,
                        %current,
                        "Charged amount differs from current cart price"
                    );
                }
            }
            Ok(None) => tracing::warn!(%charged, "No cart line resolves to a product anymore"),
            Err(e) => tracing::warn!(error = %e, "Could not reprice cart for drift check"),
        }
    }
}

fn log_outcome(outcome: &ListenerOutcome) {
    match outcome {
        ListenerOutcome::Rejected(reason) => {
            tracing::warn!(outcome = outcome.as_str(), ?reason, "Payment notification rejected");
        }
        ListenerOutcome::Duplicate => {
            tracing::info!(outcome = outcome.as_str(), "Duplicate payment notification ignored");
        }
        ListenerOutcome::Discarded(reason) => {
            tracing::warn!(outcome = outcome.as_str(), ?reason, "Payment notification discarded");
        }
        ListenerOutcome::Materialized(report) => {
            tracing::info!(
                outcome = outcome.as_str(),
                orders_created = report.orders_created,
                lines_skipped = report.lines_skipped,
                customer_id = %report.customer_id,
                "Payment notification materialized"
            );
        }
        ListenerOutcome::Failed(error) => {
            tracing::error!(outcome = outcome.as_str(), error = %error, "Payment notification failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    use peoplecart_core::{CartLine, CategoryId, CheckoutIntent, Product, ProductId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::User;
    use crate::services::payments::{Verification, VerifyError};

    /// Verifier with a canned answer; `None` simulates an unreachable processor.
    struct FixedVerifier(Option<Verification>);

    impl PaymentVerifier for FixedVerifier {
        async fn verify(&self, _raw_body: &[u8]) -> Result<Verification, VerifyError> {
            self.0.ok_or(VerifyError::Status(503))
        }
    }

    const VERIFIED: FixedVerifier = FixedVerifier(Some(Verification::Verified));

    fn receiver() -> Email {
        Email::parse("shop@example.com").unwrap()
    }

    fn signer() -> IntentSigner {
        IntentSigner::new(b"r7Yp2Kd9Wm4Xq1Bz6Nc3Vt8Hf5Lg0Js", CurrencyCode::USD).unwrap()
    }

    fn book(id: i32, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Book {id}"),
            price,
            is_sale: false,
            sale_price: None,
            category_id: CategoryId::new(1),
            description: String::new(),
            image: None,
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_product(book(1, dec!(14.99)));
        store.insert_product(book(2, dec!(20.00)));
        store.insert_user(User {
            id: UserId::new(5),
            username: "scout".to_owned(),
            email: Email::parse("scout@example.com").unwrap(),
            first_name: String::new(),
            last_name: "Finch".to_owned(),
        });
        store
    }

    fn seal(user_id: i32, lines: &[(i32, u32)], charge: Decimal) -> String {
        let lines = lines
            .iter()
            .map(|&(id, quantity)| CartLine::new(ProductId::new(id), quantity))
            .collect();
        signer()
            .seal(&CheckoutIntent::new(UserId::new(user_id), lines), charge)
            .unwrap()
    }

    /// Two copies of book 1 plus an unknown book, as sealed at checkout.
    fn cart() -> String {
        seal(5, &[(1, 2), (999, 1)], dec!(32.98))
    }

    fn body_paying(txn_id: &str, status: &str, custom: &str, gross: &str) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("txn_id", txn_id)
            .append_pair("payment_status", status)
            .append_pair("custom", custom)
            .append_pair("receiver_email", "Shop@Example.com")
            .append_pair("mc_gross", gross)
            .append_pair("mc_currency", "USD")
            .append_pair("address_street", "1 Main St")
            .append_pair("contact_phone", "555-0100")
            .finish()
            .into_bytes()
    }

    fn body(txn_id: &str, status: &str, custom: &str) -> Vec<u8> {
        body_paying(txn_id, status, custom, "32.98")
    }

    #[tokio::test]
    async fn test_completed_notification_materializes() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        let outcome = listener.handle(&body("TX1", "Completed", &cart())).await;

        assert!(matches!(outcome, ListenerOutcome::Materialized(ref r) if r.orders_created == 1));
        let customers = store.customers();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers.first().unwrap().first_name, "scout");
        assert_eq!(store.orders().len(), 1);

        let record = store.notification("TX1").unwrap();
        assert_eq!(record.outcome, "materialized");
        assert_eq!(record.orders_created, 1);
    }

    #[tokio::test]
    async fn test_non_completed_status_creates_nothing() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        for status in ["Pending", "Reversed", "Failed", "completed"] {
            let outcome = listener.handle(&body("TX2", status, &cart())).await;
            assert!(matches!(
                outcome,
                ListenerOutcome::Rejected(RejectReason::NotCompleted(_))
            ));
        }
        assert!(store.orders().is_empty());
        assert!(store.customers().is_empty());
        assert!(store.notification("TX2").is_none());
    }

    #[tokio::test]
    async fn test_invalid_or_unverifiable_notification_is_rejected() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());

        let invalid = FixedVerifier(Some(Verification::Invalid));
        let outcome = PaymentListener::new(&store, &invalid, &signer, &receiver)
            .handle(&body("TX3", "Completed", &cart()))
            .await;
        assert!(matches!(outcome, ListenerOutcome::Rejected(RejectReason::Invalid)));

        let offline = FixedVerifier(None);
        let outcome = PaymentListener::new(&store, &offline, &signer, &receiver)
            .handle(&body("TX3", "Completed", &cart()))
            .await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Rejected(RejectReason::VerificationUnavailable(_))
        ));

        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn test_unsealed_custom_data_creates_nothing() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        for (txn, custom) in [
            ("TX4", "not json"),
            ("TX5", ""),
            ("TX6", r#"{"user_id":5,"cart_items":[{"id":1,"quantity":2}]}"#),
        ] {
            let outcome = listener.handle(&body(txn, "Completed", custom)).await;
            assert!(matches!(
                outcome,
                ListenerOutcome::Rejected(RejectReason::Forged(SealError::Unsealed))
            ));
            assert!(store.notification(txn).is_none());
        }
        assert!(store.orders().is_empty());
        assert!(store.customers().is_empty());
    }

    #[tokio::test]
    async fn test_raised_quantity_in_custom_data_is_rejected() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        let honest = seal(5, &[(1, 1)], dec!(16.49));
        let edited = honest.replace(r#""quantity":1"#, r#""quantity":50"#);

        let outcome = listener
            .handle(&body_paying("TX14", "Completed", &edited, "16.49"))
            .await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Rejected(RejectReason::Forged(SealError::BadSignature))
        ));
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn test_underpaid_notification_is_rejected() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);
        let custom = seal(5, &[(1, 50)], dec!(824.45));

        let outcome = listener
            .handle(&body_paying("TX15", "Completed", &custom, "0.01"))
            .await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Rejected(RejectReason::Underpaid { expected, paid: Some(paid) })
                if expected == dec!(824.45) && paid == dec!(0.01)
        ));

        let missing_gross = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("txn_id", "TX16")
            .append_pair("payment_status", "Completed")
            .append_pair("custom", &custom)
            .append_pair("receiver_email", "shop@example.com")
            .append_pair("mc_currency", "USD")
            .finish();
        assert!(matches!(
            listener.handle(missing_gross.as_bytes()).await,
            ListenerOutcome::Rejected(RejectReason::Underpaid { paid: None, .. })
        ));

        assert!(store.orders().is_empty());
        assert!(store.notification("TX15").is_none());
    }

    #[tokio::test]
    async fn test_other_currency_is_rejected() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        let notification = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("txn_id", "TX17")
            .append_pair("payment_status", "Completed")
            .append_pair("custom", &cart())
            .append_pair("receiver_email", "shop@example.com")
            .append_pair("mc_gross", "32.98")
            .append_pair("mc_currency", "JPY")
            .finish();

        assert!(matches!(
            listener.handle(notification.as_bytes()).await,
            ListenerOutcome::Rejected(RejectReason::CurrencyMismatch(Some(ref c))) if c == "JPY"
        ));
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_unknown_user_and_bad_quantity_are_discarded() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        let outcome = listener
            .handle(&body_paying("TX7", "Completed", &seal(5, &[], dec!(0)), "0.00"))
            .await;
        assert!(matches!(outcome, ListenerOutcome::Discarded(DiscardReason::EmptyCart)));

        let outcome = listener
            .handle(&body_paying("TX8", "Completed", &seal(77, &[(1, 1)], dec!(16.49)), "16.49"))
            .await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Discarded(DiscardReason::UnknownUser(id)) if id == UserId::new(77)
        ));

        let outcome = listener
            .handle(&body_paying("TX18", "Completed", &seal(5, &[(1, 0)], dec!(0)), "0.00"))
            .await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Discarded(DiscardReason::Intent(IntentError::InvalidQuantity { .. }))
        ));

        assert!(store.customers().is_empty());
        assert_eq!(store.notification("TX8").unwrap().outcome, "discarded");
        assert_eq!(store.notification("TX18").unwrap().outcome, "discarded");
    }

    #[tokio::test]
    async fn test_redelivery_is_duplicate() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);
        let notification = body("TX9", "Completed", &cart());

        listener.handle(&notification).await;
        let second = listener.handle(&notification).await;

        assert!(matches!(second, ListenerOutcome::Duplicate));
        assert_eq!(store.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_receiver_is_rejected() {
        let store = seeded_store();
        let signer = signer();
        let other = Email::parse("someone-else@example.com").unwrap();
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &other);

        let outcome = listener.handle(&body("TX10", "Completed", &cart())).await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Rejected(RejectReason::ReceiverMismatch(Some(_)))
        ));
        assert!(store.notification("TX10").is_none());
    }

    #[tokio::test]
    async fn test_unreadable_body_is_rejected() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        let outcome = listener.handle(b"\xff\xfe garbage").await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Rejected(RejectReason::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_before_claim() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        store.set_unavailable(true);
        let outcome = listener.handle(&body("TX11", "Completed", &cart())).await;
        assert!(matches!(outcome, ListenerOutcome::Failed(ListenerError::Store(_))));

        store.set_unavailable(false);
        assert!(store.notification("TX11").is_none());
    }

    #[tokio::test]
    async fn test_materialize_failure_releases_claim_for_retry() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);

        store.set_order_writes_failing(true);
        let outcome = listener.handle(&body("TX12", "Completed", &cart())).await;
        assert!(matches!(
            outcome,
            ListenerOutcome::Failed(ListenerError::Materialize(_))
        ));
        assert!(store.notification("TX12").is_none());

        store.set_order_writes_failing(false);
        let retry = listener.handle(&body("TX12", "Completed", &cart())).await;
        assert!(matches!(retry, ListenerOutcome::Materialized(_)));
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_batch_then_redelivery_writes_each_line_once() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);
        let notification = body_paying(
            "TX19",
            "Completed",
            &seal(5, &[(1, 1), (2, 1)], dec!(38.49)),
            "38.49",
        );

        store.fail_order_write(2);
        let first = listener.handle(&notification).await;
        assert!(matches!(first, ListenerOutcome::Failed(_)));
        assert!(store.orders().is_empty());

        let retry = listener.handle(&notification).await;
        assert!(matches!(retry, ListenerOutcome::Materialized(ref r) if r.orders_created == 2));

        let products: Vec<i32> = store
            .orders()
            .iter()
            .map(|o| o.product_id.as_i32())
            .collect();
        assert_eq!(products, [1, 2]);
    }

    #[tokio::test]
    async fn test_claim_abandoned_by_dead_worker_is_taken_over() {
        let store = seeded_store();
        let (signer, receiver) = (signer(), receiver());
        let listener = PaymentListener::new(&store, &VERIFIED, &signer, &receiver);
        let notification = body("TX20", "Completed", &cart());

        // A worker claimed the transaction and never finished.
        assert!(store.claim_transaction("TX20").await.unwrap());
        assert!(matches!(
            listener.handle(&notification).await,
            ListenerOutcome::Duplicate
        ));

        store.age_notification("TX20", TimeDelta::minutes(15));
        assert!(matches!(
            listener.handle(&notification).await,
            ListenerOutcome::Materialized(_)
        ));
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.notification("TX20").unwrap().outcome, "materialized");
    }
}
