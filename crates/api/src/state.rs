//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::{AccountStore, PhoneRepository, UserRepository};
use crate::services::{
    Argon2Hasher, Authenticator, CredentialHasher, Hs256Verifier, PhoneService, TaggedCache,
    TokenVerifier, UserService,
};

/// The persistence collaborators the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountStore>,
    pub phones: Arc<dyn PhoneRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Use one store for every repository.
    #[must_use]
    pub fn single<S>(store: Arc<S>) -> Self
    where
        S: AccountStore + PhoneRepository + UserRepository + 'static,
    {
        Self {
            accounts: store.clone(),
            phones: store.clone(),
            users: store,
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The cache is created once here
/// and handed to both resource services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    authenticator: Authenticator,
    phones: PhoneService,
    users: UserService,
    cache: TaggedCache,
}

impl AppState {
    /// Create the state with the production verifier and hasher.
    #[must_use]
    pub fn new(config: ApiConfig, repositories: Repositories) -> Self {
        let verifier = Arc::new(Hs256Verifier::new(
            &config.jwt.secret,
            config.jwt.leeway_secs,
        ));
        Self::with_collaborators(config, repositories, verifier, Arc::new(Argon2Hasher))
    }

    /// Create the state with explicit token verifier and credential hasher.
    #[must_use]
    pub fn with_collaborators(
        config: ApiConfig,
        repositories: Repositories,
        verifier: Arc<dyn TokenVerifier>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let cache = TaggedCache::new(&config.cache);
        let authenticator = Authenticator::new(verifier, repositories.accounts);
        let phones = PhoneService::new(repositories.phones, cache.clone());
        let users = UserService::new(repositories.users, hasher, cache.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                authenticator,
                phones,
                users,
                cache,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get the caller resolver.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    /// Get the catalog service.
    #[must_use]
    pub fn phones(&self) -> &PhoneService {
        &self.inner.phones
    }

    /// Get the sub-account service.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    /// Get the shared list cache.
    #[must_use]
    pub fn cache(&self) -> &TaggedCache {
        &self.inner.cache
    }
}
