//! Catalog product domain type.

use serde::Serialize;

use handset_core::{PhoneId, Price};

/// A phone in the catalog.
///
/// Phones have no owner and are readable by any authenticated customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone {
    pub id: PhoneId,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub price: Price,
    pub color: String,
    pub screen_size: String,
    /// Storage capacity in GB, always positive.
    pub capacity: u32,
    pub description: String,
    /// Image URL.
    pub image: String,
}
