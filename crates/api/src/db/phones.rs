//! Phone catalog repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use handset_core::{PhoneId, Price};

use super::{PhoneRepository, RepositoryError};
use crate::models::{Pagination, Phone};

/// `PostgreSQL`-backed phone catalog.
#[derive(Debug, Clone)]
pub struct PgPhoneRepository {
    pool: PgPool,
}

impl PgPhoneRepository {
    /// Create a new phone repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PhoneRow {
    id: i32,
    name: String,
    brand: String,
    model: String,
    price: Decimal,
    color: String,
    screen_size: String,
    capacity: i32,
    description: String,
    image: String,
}

impl TryFrom<PhoneRow> for Phone {
    type Error = RepositoryError;

    fn try_from(row: PhoneRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for phone {}: {e}", row.id))
        })?;
        let capacity = u32::try_from(row.capacity)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid capacity for phone {}: {}",
                    row.id, row.capacity
                ))
            })?;

        Ok(Self {
            id: PhoneId::new(row.id),
            name: row.name,
            brand: row.brand,
            model: row.model,
            price,
            color: row.color,
            screen_size: row.screen_size,
            capacity,
            description: row.description,
            image: row.image,
        })
    }
}

#[async_trait]
impl PhoneRepository for PgPhoneRepository {
    async fn find_page(&self, page: Pagination) -> Result<Vec<Phone>, RepositoryError> {
        let rows = sqlx::query_as::<_, PhoneRow>(
            r"
            SELECT id, name, brand, model, price, color, screen_size,
                   capacity, description, image
            FROM phones
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.row_limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Phone::try_from).collect()
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, RepositoryError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            r"
            SELECT id, name, brand, model, price, color, screen_size,
                   capacity, description, image
            FROM phones
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Phone::try_from).transpose()
    }
}
