//! Domain models for the catalog API.
//!
//! These types represent validated domain objects separate from database row
//! types and from request bodies.

pub mod customer;
pub mod pagination;
pub mod phone;
pub mod user;
pub mod validation;

pub use customer::Customer;
pub use pagination::Pagination;
pub use phone::Phone;
pub use user::{CreateUserRequest, NewUser, User, ValidatedUser};
pub use validation::ValidationErrors;
