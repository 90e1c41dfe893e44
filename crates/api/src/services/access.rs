//! Ownership checks for customer-scoped resources.

use tracing::warn;

use handset_core::CustomerId;

use crate::error::AppError;
use crate::models::{Customer, User};

/// Message returned when the caller does not own the resource.
pub const ACCESS_DENIED: &str = "Vous n'avez pas accès à cette ressource.";

/// A resource that may belong to a customer.
pub trait Owned {
    /// The owning customer, if any.
    fn owner_id(&self) -> Option<CustomerId>;
}

impl Owned for User {
    fn owner_id(&self) -> Option<CustomerId> {
        Some(self.customer_id)
    }
}

/// Whether `caller` owns `resource`. Unowned resources are owned by nobody.
#[must_use]
pub fn is_owner(caller: &Customer, resource: &impl Owned) -> bool {
    resource.owner_id() == Some(caller.id)
}

/// Deny access unless `caller` owns `resource`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the owner differs.
pub fn ensure_owner(caller: &Customer, resource: &impl Owned) -> Result<(), AppError> {
    if is_owner(caller, resource) {
        return Ok(());
    }

    warn!(
        caller_id = %caller.id,
        owner_id = ?resource.owner_id().map(|id| id.as_i32()),
        "Denied access to resource owned by another customer"
    );
    Err(AppError::Forbidden(ACCESS_DENIED.to_owned()))
}
