//! Payment processor notification endpoint.
//!
//! The processor delivers notifications at least once and retries anything
//! that is not a 200. Every notification is acknowledged immediately; the
//! listener runs in its own task so a slow or failing notification neither
//! delays the acknowledgement nor affects later ones.

use axum::{Extension, body::Bytes, extract::State, http::StatusCode};
use tracing::{Instrument, instrument};

use crate::middleware::RequestId;
use crate::services::PaymentListener;
use crate::state::AppState;

/// Receive a payment notification.
///
/// Always returns 200 OK.
#[instrument(skip(state, request_id, body), fields(bytes = body.len()))]
pub async fn notify(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> StatusCode {
    let request_id = request_id.map_or_else(String::new, |Extension(RequestId(id))| id);
    let span = tracing::info_span!("payment_notification", request_id = %request_id);

    tokio::spawn(
        async move {
            let listener = PaymentListener::new(
                state.store(),
                state.verifier(),
                state.intent_signer(),
                &state.config().payment.receiver_email,
            );
            let outcome = listener.handle(&body).await;
            tracing::debug!(outcome = outcome.as_str(), "notification task finished");
        }
        .instrument(span),
    );

    StatusCode::OK
}
