//! Role sets granted to sub-accounts.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The base role every sub-account holds.
pub const DEFAULT_ROLE: &str = "ROLE_USER";

/// The roles granted to a sub-account.
///
/// [`DEFAULT_ROLE`] is always part of the effective set, whether or not it
/// was stored. Roles are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Build a role set from explicitly granted roles.
    ///
    /// Blank entries are dropped.
    #[must_use]
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            roles
                .into_iter()
                .map(Into::into)
                .map(|role| role.trim().to_owned())
                .filter(|role| !role.is_empty())
                .collect(),
        )
    }

    /// Whether the effective set contains `role`.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        role == DEFAULT_ROLE || self.0.contains(role)
    }

    /// The explicitly granted roles, as persisted.
    #[must_use]
    pub fn granted(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// The effective roles, always including [`DEFAULT_ROLE`].
    #[must_use]
    pub fn effective(&self) -> Vec<String> {
        let mut roles = self.0.clone();
        roles.insert(DEFAULT_ROLE.to_owned());
        roles.into_iter().collect()
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.effective().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::new(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_always_effective() {
        let roles = RoleSet::default();
        assert!(roles.contains(DEFAULT_ROLE));
        assert_eq!(roles.effective(), vec![DEFAULT_ROLE.to_owned()]);
        assert!(roles.granted().is_empty());
    }

    #[test]
    fn test_deduplicates_and_drops_blank() {
        let roles = RoleSet::new(["ROLE_ADMIN", " ", "ROLE_ADMIN", "ROLE_USER"]);
        assert_eq!(roles.effective(), vec!["ROLE_ADMIN", "ROLE_USER"]);
    }

    #[test]
    fn test_serializes_effective_roles() {
        let roles = RoleSet::new(["ROLE_ADMIN"]);
        let json = serde_json::to_string(&roles).unwrap_or_default();
        assert_eq!(json, r#"["ROLE_ADMIN","ROLE_USER"]"#);
    }
}
