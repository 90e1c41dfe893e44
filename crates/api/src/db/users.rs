//! Sub-account repository.

use async_trait::async_trait;
use sqlx::PgPool;

use handset_core::{CustomerId, Email, RoleSet, UserId};

use super::{RepositoryError, UserRepository};
use crate::models::{NewUser, Pagination, User};

/// `PostgreSQL`-backed sub-account store.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    customer_id: i32,
    email: String,
    roles: Vec<String>,
    password: String,
    firstname: String,
    lastname: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            roles: RoleSet::new(row.roles),
            password_hash: row.password,
            first_name: row.firstname,
            last_name: row.lastname,
            customer_id: CustomerId::new(row.customer_id),
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_page_by_owner(
        &self,
        owner: CustomerId,
        page: Pagination,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, customer_id, email, roles, password, firstname, lastname
            FROM users
            WHERE customer_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(owner.as_i32())
        .bind(page.row_limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, customer_id, email, roles, password, firstname, lastname
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn save(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (customer_id, email, roles, password, firstname, lastname)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, customer_id, email, roles, password, firstname, lastname
            ",
        )
        .bind(user.customer_id.as_i32())
        .bind(user.email.as_str())
        .bind(user.roles.granted())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        User::try_from(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
