//! Sub-account service.
//!
//! Every operation is scoped to the calling customer: lists only contain the
//! caller's users, and detail/delete are refused for anyone else's. Creating
//! or deleting a user invalidates the `userList` cache tag once the change
//! is persisted.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use handset_core::UserId;

use super::access::{ACCESS_DENIED, ensure_owner};
use super::auth::CredentialHasher;
use super::cache::{CacheKey, TaggedCache, USER_LIST_TAG};
use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::models::user::messages;
use crate::models::{CreateUserRequest, Customer, Pagination, User, ValidationErrors};

/// Message returned when a user id matches nothing.
pub const USER_NOT_FOUND: &str = "Utilisateur introuvable.";

/// Customer-scoped operations on sub-accounts.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    cache: TaggedCache,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        cache: TaggedCache,
    ) -> Self {
        Self {
            users,
            hasher,
            cache,
        }
    }

    /// One page of the caller's users as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the page cannot be loaded.
    #[instrument(skip(self, caller), fields(customer_id = %caller.id, page = page.page, limit = page.limit))]
    pub async fn list(&self, caller: &Customer, page: Pagination) -> Result<Arc<str>, AppError> {
        let owner = caller.id;
        let key = CacheKey::Users { owner, page };
        let repository = &self.users;
        self.cache
            .get_or_compute(&key.to_string(), &[key.tag()], move || async move {
                let users = repository.find_page_by_owner(owner, page).await?;
                Ok::<_, AppError>(serde_json::to_string(&users)?)
            })
            .await
            .map_err(AppError::from_shared)
    }

    /// A single user owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id matches nothing and
    /// `AppError::Forbidden` if another customer owns it.
    #[instrument(skip(self, caller), fields(customer_id = %caller.id, user_id = %id))]
    pub async fn get(&self, caller: &Customer, id: UserId) -> Result<User, AppError> {
        let user = self.find(id).await?;
        ensure_owner(caller, &user)?;
        Ok(user)
    }

    /// Create a user owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the body names another customer,
    /// `AppError::Validation` if a field is invalid or the email is taken.
    #[instrument(skip(self, caller, request), fields(customer_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Customer,
        request: CreateUserRequest,
    ) -> Result<User, AppError> {
        if let Some(requested) = request.customer_id
            && requested != caller.id.as_i32()
        {
            warn!(requested, "Refused to create a user for another customer");
            return Err(AppError::Forbidden(ACCESS_DENIED.to_owned()));
        }

        let validated = request.validate()?;
        let password_hash = self.hasher.hash(&validated.password)?;
        if password_hash.trim().is_empty() {
            return Err(ValidationErrors::single("password", messages::PASSWORD_REQUIRED).into());
        }

        let user = self
            .users
            .save(validated.into_new_user(caller.id, password_hash))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AppError::from(ValidationErrors::single("email", messages::EMAIL_TAKEN))
                }
                other => AppError::Database(other),
            })?;

        self.cache.invalidate(USER_LIST_TAG);
        info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    /// Delete a user owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id matches nothing and
    /// `AppError::Forbidden` if another customer owns it.
    #[instrument(skip(self, caller), fields(customer_id = %caller.id, user_id = %id))]
    pub async fn delete(&self, caller: &Customer, id: UserId) -> Result<(), AppError> {
        let user = self.find(id).await?;
        ensure_owner(caller, &user)?;

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound(USER_NOT_FOUND.to_owned()));
        }

        self.cache.invalidate(USER_LIST_TAG);
        info!("Deleted user");
        Ok(())
    }

    async fn find(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::{ExposeSecret, SecretString};

    use handset_core::{CustomerId, Email, RoleSet};

    use super::*;
    use crate::config::CacheConfig;
    use crate::db::memory::InMemoryStore;
    use crate::models::NewUser;
    use crate::services::auth::AuthError;

    /// Reversible stand-in so tests stay fast.
    struct PrefixHasher(&'static str);

    impl CredentialHasher for PrefixHasher {
        fn hash(&self, password: &SecretString) -> Result<String, AuthError> {
            if self.0.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("{}{}", self.0, password.expose_secret()))
        }

        fn verify(&self, password: &SecretString, hash: &str) -> bool {
            hash.strip_prefix(self.0) == Some(password.expose_secret())
        }
    }

    struct Fixture {
        service: UserService,
        store: Arc<InMemoryStore>,
        cache: TaggedCache,
        alice: Customer,
        bob: Customer,
    }

    async fn fixture_with(hasher: PrefixHasher) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let alice = store
            .add_customer(Email::parse("alice@shop.example").unwrap(), "Alice's Shop")
            .await;
        let bob = store
            .add_customer(Email::parse("bob@shop.example").unwrap(), "Bob's Shop")
            .await;
        let cache = TaggedCache::new(&CacheConfig::default());
        let service = UserService::new(store.clone(), Arc::new(hasher), cache.clone());
        Fixture {
            service,
            store,
            cache,
            alice,
            bob,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(PrefixHasher("hashed:")).await
    }

    fn new_user(owner: CustomerId, email: &str) -> NewUser {
        NewUser {
            customer_id: owner,
            email: Email::parse(email).unwrap(),
            roles: RoleSet::default(),
            password_hash: "hashed:secret".to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
        }
    }

    fn request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: Some(email.to_owned()),
            password: Some("s3cret-pass".to_owned()),
            firstname: Some("Jane".to_owned()),
            lastname: Some("Doe".to_owned()),
            roles: vec![],
            customer_id: None,
        }
    }

    fn ids(payload: &str) -> Vec<i64> {
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_list_only_returns_callers_users() {
        let f = fixture().await;
        let mine = f.store.add_user(new_user(f.alice.id, "a1@x.io")).await;
        f.store.add_user(new_user(f.bob.id, "b1@x.io")).await;

        let page = f.service.list(&f.alice, Pagination::default()).await.unwrap();
        assert_eq!(ids(&page), vec![i64::from(mine.id.as_i32())]);
    }

    #[tokio::test]
    async fn test_list_cache_is_scoped_to_caller() {
        let f = fixture().await;
        f.store.add_user(new_user(f.alice.id, "a1@x.io")).await;

        let alice_page = f.service.list(&f.alice, Pagination::default()).await.unwrap();
        let bob_page = f.service.list(&f.bob, Pagination::default()).await.unwrap();

        assert_eq!(ids(&alice_page).len(), 1);
        assert!(ids(&bob_page).is_empty());
        assert_eq!(f.store.user_page_calls(), 2);
    }

    #[tokio::test]
    async fn test_create_persists_then_invalidates() {
        let f = fixture().await;
        let before = f.service.list(&f.alice, Pagination::default()).await.unwrap();
        assert!(ids(&before).is_empty());

        let user = f
            .service
            .create(&f.alice, request("new@x.io"))
            .await
            .unwrap();
        assert_eq!(user.customer_id, f.alice.id);
        assert_eq!(user.password_hash, "hashed:s3cret-pass");
        assert_eq!(f.cache.generation(USER_LIST_TAG), 1);

        let after = f.service.list(&f.alice, Pagination::default()).await.unwrap();
        assert_eq!(ids(&after), vec![i64::from(user.id.as_i32())]);
    }

    #[tokio::test]
    async fn test_create_accepts_own_customer_id() {
        let f = fixture().await;
        let body = CreateUserRequest {
            customer_id: Some(f.alice.id.as_i32()),
            ..request("new@x.io")
        };
        assert!(f.service.create(&f.alice, body).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_for_other_customer_is_forbidden() {
        let f = fixture().await;
        let body = CreateUserRequest {
            customer_id: Some(f.bob.id.as_i32()),
            ..request("new@x.io")
        };
        let err = f.service.create(&f.alice, body).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(f.store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_create_touches_nothing() {
        let f = fixture().await;
        let body = CreateUserRequest {
            email: Some(String::new()),
            ..request("unused@x.io")
        };
        let err = f.service.create(&f.alice, body).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.get("email"), Some(messages::EMAIL_REQUIRED));
        assert_eq!(f.store.save_calls(), 0);
        assert_eq!(f.cache.generation(USER_LIST_TAG), 0);
    }

    #[tokio::test]
    async fn test_blank_hash_is_rejected() {
        let f = fixture_with(PrefixHasher("")).await;
        let err = f
            .service
            .create(&f.alice, request("new@x.io"))
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.get("password"), Some(messages::PASSWORD_REQUIRED));
        assert_eq!(f.store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_field_error() {
        let f = fixture().await;
        f.store.add_user(new_user(f.bob.id, "taken@x.io")).await;

        let err = f
            .service
            .create(&f.alice, request("taken@x.io"))
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.get("email"), Some(messages::EMAIL_TAKEN));
        assert_eq!(f.cache.generation(USER_LIST_TAG), 0);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_cache() {
        let f = fixture().await;
        f.store.set_unavailable(true);
        let err = f
            .service
            .create(&f.alice, request("new@x.io"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(f.cache.generation(USER_LIST_TAG), 0);
    }

    #[tokio::test]
    async fn test_get_and_delete_check_ownership() {
        let f = fixture().await;
        let theirs = f.store.add_user(new_user(f.bob.id, "b1@x.io")).await;

        assert!(matches!(
            f.service.get(&f.alice, theirs.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(&f.alice, theirs.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(f.store.delete_calls(), 0);
        assert_eq!(f.cache.generation(USER_LIST_TAG), 0);

        assert_eq!(f.service.get(&f.bob, theirs.id).await.unwrap(), theirs);
    }

    #[tokio::test]
    async fn test_delete_owned_user() {
        let f = fixture().await;
        let mine = f.store.add_user(new_user(f.alice.id, "a1@x.io")).await;

        f.service.delete(&f.alice, mine.id).await.unwrap();

        assert_eq!(f.store.user_count().await, 0);
        assert_eq!(f.cache.generation(USER_LIST_TAG), 1);
        assert!(matches!(
            f.service.delete(&f.alice, mine.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
