//! Account lookups.
//!
//! Accounts are owned by the authentication layer; the storefront only reads
//! them.

use tracing::instrument;

use peoplecart_core::{Email, UserId};

use super::{AccountStore, PgStore, RepositoryError};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
        })
    }
}

impl AccountStore for PgStore {
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, first_name, last_name
            FROM storefront.app_user
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }
}
