//! User address book persistence.
//!
//! Default-address exclusivity is enforced by write-side sequencing: unset
//! every default for the user, then set the chosen one, inside a single
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;

use marram_core::{AddressId, CountryCode, UserId};

use super::StoreError;
use crate::models::address::{Address, NewAddress};

const ADDRESS_COLUMNS: &str = "id, user_id, recipient, line1, line2, city, postal_code, \
                               country, is_default_shipping, is_default_billing, created_at";

#[derive(FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    recipient: String,
    line1: String,
    line2: Option<String>,
    city: String,
    postal_code: String,
    country: String,
    is_default_shipping: bool,
    is_default_billing: bool,
    created_at: DateTime<Utc>,
}

impl AddressRow {
    fn into_address(self) -> Result<Address, StoreError> {
        let country = CountryCode::parse(&self.country).map_err(|e| {
            StoreError::DataCorruption(format!("address {} country: {e}", self.id))
        })?;
        Ok(Address {
            id: AddressId::new(self.id),
            user_id: UserId::new(self.user_id),
            recipient: self.recipient,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            postal_code: self.postal_code,
            country,
            is_default_shipping: self.is_default_shipping,
            is_default_billing: self.is_default_billing,
            created_at: self.created_at,
        })
    }
}

/// `PostgreSQL`-backed address store.
#[derive(Clone)]
pub struct PgAddressStore {
    pool: PgPool,
}

impl PgAddressStore {
    /// Create an address store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All addresses of a user, defaults first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure or corrupt rows.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Address>, StoreError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE user_id = $1
             ORDER BY is_default_shipping DESC, is_default_billing DESC, id"
        ))
        .bind(user.as_i32())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AddressRow::into_address).collect()
    }

    /// Create an address, optionally making it a default.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn create(
        &self,
        user: UserId,
        address: &NewAddress,
        default_shipping: bool,
        default_billing: bool,
    ) -> Result<Address, StoreError> {
        let mut tx = self.pool.begin().await?;
        if default_shipping {
            sqlx::query(
                "UPDATE storefront.address SET is_default_shipping = FALSE WHERE user_id = $1",
            )
            .bind(user.as_i32())
            .execute(&mut *tx)
            .await?;
        }
        if default_billing {
            sqlx::query(
                "UPDATE storefront.address SET is_default_billing = FALSE WHERE user_id = $1",
            )
            .bind(user.as_i32())
            .execute(&mut *tx)
            .await?;
        }

        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO storefront.address
                 (user_id, recipient, line1, line2, city, postal_code, country,
                  is_default_shipping, is_default_billing)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user.as_i32())
        .bind(&address.recipient)
        .bind(&address.line1)
        .bind(address.line2.as_deref())
        .bind(&address.city)
        .bind(&address.postal_code)
        .bind(address.country.as_str())
        .bind(default_shipping)
        .bind(default_billing)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        row.into_address()
    }

    /// Make an existing address the user's default shipping address.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the address is not the user's.
    pub async fn set_default_shipping(
        &self,
        user: UserId,
        address: AddressId,
    ) -> Result<(), StoreError> {
        self.set_default(user, address, "is_default_shipping").await
    }

    /// Make an existing address the user's default billing address.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the address is not the user's.
    pub async fn set_default_billing(
        &self,
        user: UserId,
        address: AddressId,
    ) -> Result<(), StoreError> {
        self.set_default(user, address, "is_default_billing").await
    }

    async fn set_default(
        &self,
        user: UserId,
        address: AddressId,
        column: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "UPDATE storefront.address SET {column} = FALSE WHERE user_id = $1"
        ))
        .bind(user.as_i32())
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query(&format!(
            "UPDATE storefront.address SET {column} = TRUE WHERE id = $1 AND user_id = $2"
        ))
        .bind(address.as_i32())
        .bind(user.as_i32())
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }
}
