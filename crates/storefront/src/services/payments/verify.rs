//! Re-verification of notifications with the processor.
//!
//! The exact notification body is posted back to the processor's
//! verification endpoint prefixed with `cmd=_notify-validate&`. The processor
//! answers with a bare `VERIFIED` or `INVALID`.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use thiserror::Error;
use url::Url;

/// Prefix the processor expects on a verification postback.
pub const VALIDATE_PREFIX: &[u8] = b"cmd=_notify-validate&";

/// Timeout for one verification round trip.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// The processor's answer to a verification postback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Invalid,
}

/// Errors that can occur when talking to the verification endpoint.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned a non-success status.
    #[error("verification endpoint returned {0}")]
    Status(u16),

    /// Endpoint answered something other than `VERIFIED` or `INVALID`.
    #[error("unexpected verification response: {0}")]
    UnexpectedResponse(String),
}

/// Confirms a notification body with the processor.
pub trait PaymentVerifier: Send + Sync {
    /// Ask the processor whether `raw_body` is a notification it sent.
    fn verify(
        &self,
        raw_body: &[u8],
    ) -> impl Future<Output = Result<Verification, VerifyError>> + Send;
}

/// Verifier using the processor's notification postback protocol.
#[derive(Debug, Clone)]
pub struct IpnVerifier {
    client: reqwest::Client,
    verify_url: Url,
}

impl IpnVerifier {
    /// Create a verifier posting to `verify_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(verify_url: Url) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .user_agent(concat!("peoplecart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, verify_url })
    }

    /// The endpoint this verifier posts to.
    #[must_use]
    pub const fn verify_url(&self) -> &Url {
        &self.verify_url
    }
}

impl PaymentVerifier for IpnVerifier {
    async fn verify(&self, raw_body: &[u8]) -> Result<Verification, VerifyError> {
        let mut body = Vec::with_capacity(VALIDATE_PREFIX.len() + raw_body.len());
        body.extend_from_slice(VALIDATE_PREFIX);
        body.extend_from_slice(raw_body);

        let response = self
            .client
            .post(self.verify_url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(VerifyError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        match text.trim() {
            "VERIFIED" => Ok(Verification::Verified),
            "INVALID" => Ok(Verification::Invalid),
            other => Err(VerifyError::UnexpectedResponse(
                other.chars().take(64).collect(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn verifier_for(server: &MockServer) -> IpnVerifier {
        let url = Url::parse(&format!("{}/cgi-bin/webscr", server.uri())).unwrap();
        IpnVerifier::new(url).unwrap()
    }

    #[tokio::test]
    async fn test_posts_prefixed_body_and_reads_verified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/webscr"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string(
                "cmd=_notify-validate&txn_id=ABC&payment_status=Completed",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("VERIFIED"))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server);
        let result = verifier
            .verify(b"txn_id=ABC&payment_status=Completed")
            .await
            .unwrap();
        assert_eq!(result, Verification::Verified);
    }

    #[tokio::test]
    async fn test_reads_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("INVALID\n"))
            .mount(&server)
            .await;

        let verifier = verifier_for(&server);
        assert_eq!(
            verifier.verify(b"txn_id=ABC").await.unwrap(),
            Verification::Invalid
        );
    }

    #[tokio::test]
    async fn test_error_status_and_garbage_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let down = IpnVerifier::new(Url::parse(&format!("{}/down", server.uri())).unwrap()).unwrap();
        assert!(matches!(
            down.verify(b"txn_id=ABC").await,
            Err(VerifyError::Status(503))
        ));

        let garbage =
            IpnVerifier::new(Url::parse(&format!("{}/garbage", server.uri())).unwrap()).unwrap();
        assert!(matches!(
            garbage.verify(b"txn_id=ABC").await,
            Err(VerifyError::UnexpectedResponse(_))
        ));
    }
}
