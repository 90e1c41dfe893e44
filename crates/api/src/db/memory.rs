//! In-memory repositories.
//!
//! Backs the unit and integration tests. Every trait method goes through the
//! same lock so a single store can serve as account store, catalog, and user
//! repository at once. Call counters let tests observe whether a request was
//! answered from the cache or reached storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use handset_core::{CustomerId, Email, PhoneId, UserId};

use super::{AccountStore, PhoneRepository, RepositoryError, UserRepository};
use crate::models::{Customer, NewUser, Pagination, Phone, User};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<i32, Customer>,
    phones: BTreeMap<i32, Phone>,
    users: BTreeMap<i32, User>,
}

/// Storage counters observed by tests.
#[derive(Default)]
struct Counters {
    phone_pages: AtomicUsize,
    user_pages: AtomicUsize,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

/// A process-local store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI32,
    counters: Counters,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Make every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Register a customer account.
    pub async fn add_customer(&self, email: Email, name: &str) -> Customer {
        let customer = Customer {
            id: CustomerId::new(self.allocate_id()),
            email,
            name: name.to_owned(),
        };
        self.tables
            .write()
            .await
            .customers
            .insert(customer.id.as_i32(), customer.clone());
        customer
    }

    /// Add a phone to the catalog, keeping its id.
    pub async fn add_phone(&self, phone: Phone) {
        self.tables
            .write()
            .await
            .phones
            .insert(phone.id.as_i32(), phone);
    }

    /// Insert a user directly, bypassing the save counter.
    pub async fn add_user(&self, user: NewUser) -> User {
        let user = self.materialize(user);
        self.tables
            .write()
            .await
            .users
            .insert(user.id.as_i32(), user.clone());
        user
    }

    fn materialize(&self, user: NewUser) -> User {
        User {
            id: UserId::new(self.allocate_id()),
            email: user.email,
            roles: user.roles,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            customer_id: user.customer_id,
        }
    }

    /// Number of users currently stored.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Calls to [`PhoneRepository::find_page`].
    #[must_use]
    pub fn phone_page_calls(&self) -> usize {
        self.counters.phone_pages.load(Ordering::SeqCst)
    }

    /// Calls to [`UserRepository::find_page_by_owner`].
    #[must_use]
    pub fn user_page_calls(&self) -> usize {
        self.counters.user_pages.load(Ordering::SeqCst)
    }

    /// Calls to [`UserRepository::save`].
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.counters.saves.load(Ordering::SeqCst)
    }

    /// Calls to [`UserRepository::delete`].
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.counters.deletes.load(Ordering::SeqCst)
    }
}

fn page_of<T: Clone>(rows: impl Iterator<Item = T>, page: Pagination) -> Vec<T> {
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.row_limit()).unwrap_or(usize::MAX);
    rows.skip(skip).take(take).collect()
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.email == *email)
            .cloned())
    }
}

#[async_trait]
impl PhoneRepository for InMemoryStore {
    async fn find_page(&self, page: Pagination) -> Result<Vec<Phone>, RepositoryError> {
        self.counters.phone_pages.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(page_of(tables.phones.values().cloned(), page))
    }

    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, RepositoryError> {
        self.check_available()?;
        Ok(self.tables.read().await.phones.get(&id.as_i32()).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_page_by_owner(
        &self,
        owner: CustomerId,
        page: Pagination,
    ) -> Result<Vec<User>, RepositoryError> {
        self.counters.user_pages.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let tables = self.tables.read().await;
        let owned = tables
            .users
            .values()
            .filter(|u| u.customer_id == owner)
            .cloned();
        Ok(page_of(owned, page))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.check_available()?;
        Ok(self.tables.read().await.users.get(&id.as_i32()).cloned())
    }

    async fn save(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.counters.saves.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let user = self.materialize(user);
        tables.users.insert(user.id.as_i32(), user.clone());
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .tables
            .write()
            .await
            .users
            .remove(&id.as_i32())
            .is_some())
    }
}
