//! Phone catalog service.

use std::sync::Arc;

use tracing::instrument;

use handset_core::PhoneId;

use super::cache::{CacheKey, TaggedCache};
use crate::db::PhoneRepository;
use crate::error::AppError;
use crate::models::{Pagination, Phone};

/// Message returned when a phone id matches nothing.
pub const PHONE_NOT_FOUND: &str = "Téléphone introuvable.";

/// Read-only access to the catalog. Any authenticated customer may use it.
#[derive(Clone)]
pub struct PhoneService {
    phones: Arc<dyn PhoneRepository>,
    cache: TaggedCache,
}

impl PhoneService {
    /// Create a new phone service.
    #[must_use]
    pub fn new(phones: Arc<dyn PhoneRepository>, cache: TaggedCache) -> Self {
        Self { phones, cache }
    }

    /// One page of the catalog as a JSON array, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the page cannot be loaded.
    #[instrument(skip(self), fields(page = page.page, limit = page.limit))]
    pub async fn list(&self, page: Pagination) -> Result<Arc<str>, AppError> {
        let key = CacheKey::Phones(page);
        let repository = &self.phones;
        self.cache
            .get_or_compute(&key.to_string(), &[key.tag()], move || async move {
                let phones = repository.find_page(page).await?;
                Ok::<_, AppError>(serde_json::to_string(&phones)?)
            })
            .await
            .map_err(AppError::from_shared)
    }

    /// A single phone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no phone has this id.
    #[instrument(skip(self), fields(phone_id = %id))]
    pub async fn get(&self, id: PhoneId) -> Result<Phone, AppError> {
        self.phones
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(PHONE_NOT_FOUND.to_owned()))
    }
}
