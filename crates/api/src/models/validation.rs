//! Field-level validation failures.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name → message pairs collected while validating a request body.
///
/// Serialized as a flat JSON object, e.g.
/// `{"email": "L'adresse e-mail est obligatoire."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single field failure.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a failure for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Whether no failure has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Names of the failing fields, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one failure was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "validation failed on {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.get("email"), Some("first"));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let errors = ValidationErrors::single("lastname", "required");
        let json = serde_json::to_string(&errors).unwrap_or_default();
        assert_eq!(json, r#"{"lastname":"required"}"#);
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("lastname", "x");
        errors.add("email", "y");
        assert_eq!(errors.to_string(), "validation failed on email, lastname");
    }
}
