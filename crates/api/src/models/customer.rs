//! Customer (parent account) domain type.

use serde::Serialize;

use handset_core::{CustomerId, Email};

/// A customer account.
///
/// Customers are created out-of-band (see `handset-cli customer create`) and
/// are read-only to the API. The customer resolved from a bearer token is the
/// caller identity for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Contact address, matched against the token's `username` claim.
    pub email: Email,
    /// Display name.
    pub name: String,
}
