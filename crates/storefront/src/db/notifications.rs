//! Processed payment notifications.

use tracing::instrument;

use super::{CLAIM_TIMEOUT, NotificationLedger, OUTCOME_PROCESSING, PgStore, RepositoryError};

impl NotificationLedger for PgStore {
    /// A stale `processing` row is refreshed in place, so exactly one of
    /// several concurrent redeliveries wins the takeover.
    #[instrument(skip(self))]
    async fn claim_transaction(&self, txn_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.payment_notification AS pn (txn_id, outcome)
            VALUES ($1, $2)
            ON CONFLICT (txn_id) DO UPDATE SET received_at = NOW()
            WHERE pn.outcome = $2
              AND pn.received_at < NOW() - make_interval(secs => $3)
            ",
        )
        .bind(txn_id)
        .bind(OUTCOME_PROCESSING)
        .bind(CLAIM_TIMEOUT.as_secs_f64())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn release_transaction(&self, txn_id: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM storefront.payment_notification WHERE txn_id = $1 AND outcome = $2",
        )
        .bind(txn_id)
        .bind(OUTCOME_PROCESSING)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn finish_transaction(
        &self,
        txn_id: &str,
        outcome: &str,
        orders_created: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE storefront.payment_notification
            SET outcome = $2, orders_created = $3, processed_at = NOW()
            WHERE txn_id = $1
            ",
        )
        .bind(txn_id)
        .bind(outcome)
        .bind(orders_created)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
