//! Sub-account domain types and the creation request body.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use handset_core::{CustomerId, Email, EmailError, RoleSet, UserId};

use super::ValidationErrors;

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 50;

/// User-facing validation messages.
pub mod messages {
    pub const EMAIL_REQUIRED: &str = "L'adresse e-mail est obligatoire.";
    pub const EMAIL_TOO_LONG: &str =
        "L'adresse e-mail ne peut pas faire plus de 180 caractères";
    pub const EMAIL_INVALID: &str = "L'adresse e-mail n'est pas valide.";
    pub const EMAIL_TAKEN: &str = "Cette adresse e-mail est déjà utilisée.";
    pub const PASSWORD_REQUIRED: &str = "Le mot de passe est obligatoire.";
    pub const LASTNAME_REQUIRED: &str = "Le nom de famille est obligatoire.";
    pub const LASTNAME_TOO_LONG: &str =
        "Le nom de famille ne peut pas faire plus de 50 caractères";
    pub const FIRSTNAME_REQUIRED: &str = "Le prénom est obligatoire.";
    pub const FIRSTNAME_TOO_LONG: &str = "Le prénom ne peut pas faire plus de 50 caractères";
}

/// A sub-account owned by exactly one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub roles: RoleSet,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    /// Owning customer.
    pub customer_id: CustomerId,
}

/// A validated sub-account ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub customer_id: CustomerId,
    pub email: Email,
    pub roles: RoleSet,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of `POST /api/users`.
///
/// Every field is optional at the wire level so that missing values surface
/// as field-level validation messages instead of a deserialization failure.
#[derive(Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Owning customer. Only accepted when it names the caller.
    pub customer_id: Option<i32>,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("roles", &self.roles)
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

/// A creation request whose fields passed validation.
#[derive(Debug)]
pub struct ValidatedUser {
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
}

impl CreateUserRequest {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the field → message map if any field is invalid.
    pub fn validate(self) -> Result<ValidatedUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match Email::parse(self.email.as_deref().unwrap_or_default()) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", email_message(&e));
                None
            }
        };

        let password = self.password.filter(|p| !p.trim().is_empty());
        if password.is_none() {
            errors.add("password", messages::PASSWORD_REQUIRED);
        }

        let last_name = validate_name(
            self.lastname,
            "lastname",
            messages::LASTNAME_REQUIRED,
            messages::LASTNAME_TOO_LONG,
            &mut errors,
        );
        let first_name = validate_name(
            self.firstname,
            "firstname",
            messages::FIRSTNAME_REQUIRED,
            messages::FIRSTNAME_TOO_LONG,
            &mut errors,
        );

        match (email, password, first_name, last_name) {
            (Some(email), Some(password), Some(first_name), Some(last_name)) => {
                errors.into_result(ValidatedUser {
                    email,
                    password: SecretString::from(password),
                    first_name,
                    last_name,
                    roles: RoleSet::new(self.roles),
                })
            }
            _ => Err(errors),
        }
    }
}

impl ValidatedUser {
    /// Attach the owner and the hashed credential.
    #[must_use]
    pub fn into_new_user(self, customer_id: CustomerId, password_hash: String) -> NewUser {
        NewUser {
            customer_id,
            email: self.email,
            roles: self.roles,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

fn email_message(error: &EmailError) -> &'static str {
    match error {
        EmailError::Blank => messages::EMAIL_REQUIRED,
        EmailError::TooLong { .. } => messages::EMAIL_TOO_LONG,
        EmailError::MissingAtSymbol | EmailError::EmptyLocalPart | EmailError::EmptyDomain => {
            messages::EMAIL_INVALID
        }
    }
}

fn validate_name(
    value: Option<String>,
    field: &'static str,
    required: &'static str,
    too_long: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_owned()).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, required);
        return None;
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        errors.add(field, too_long);
        return None;
    }
    Some(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete_request() -> CreateUserRequest {
        CreateUserRequest {
            email: Some("jane@retailer.example".to_owned()),
            password: Some("correct horse battery staple".to_owned()),
            firstname: Some("Jane".to_owned()),
            lastname: Some("Doe".to_owned()),
            roles: vec![],
            customer_id: None,
        }
    }

    #[test]
    fn test_complete_request_validates() {
        let user = complete_request().validate().unwrap();
        assert_eq!(user.email.as_str(), "jane@retailer.example");
        assert_eq!(user.first_name, "Jane");
        assert!(user.roles.contains(handset_core::DEFAULT_ROLE));
    }

    #[test]
    fn test_missing_email() {
        let request = CreateUserRequest {
            email: None,
            ..complete_request()
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some(messages::EMAIL_REQUIRED));
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn test_malformed_and_long_email() {
        let request = CreateUserRequest {
            email: Some("jane".to_owned()),
            ..complete_request()
        };
        assert_eq!(
            request.validate().unwrap_err().get("email"),
            Some(messages::EMAIL_INVALID)
        );

        let request = CreateUserRequest {
            email: Some(format!("{}@x.io", "j".repeat(180))),
            ..complete_request()
        };
        assert_eq!(
            request.validate().unwrap_err().get("email"),
            Some(messages::EMAIL_TOO_LONG)
        );
    }

    #[test]
    fn test_every_blank_field_is_reported() {
        let errors = CreateUserRequest::default().validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "firstname", "lastname", "password"]
        );
        assert_eq!(errors.get("password"), Some(messages::PASSWORD_REQUIRED));
    }

    #[test]
    fn test_name_length_limits() {
        let request = CreateUserRequest {
            firstname: Some("a".repeat(MAX_NAME_LENGTH)),
            lastname: Some("b".repeat(MAX_NAME_LENGTH + 1)),
            ..complete_request()
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("firstname"), None);
        assert_eq!(errors.get("lastname"), Some(messages::LASTNAME_TOO_LONG));
    }

    #[test]
    fn test_serialized_user_hides_password_hash() {
        let user = User {
            id: UserId::new(7),
            email: Email::parse("jane@retailer.example").unwrap(),
            roles: RoleSet::default(),
            password_hash: "$argon2id$v=19$...".to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            customer_id: CustomerId::new(1),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstname"], "Jane");
        assert_eq!(json["customer_id"], 1);
        assert_eq!(json["roles"], serde_json::json!(["ROLE_USER"]));
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug_output = format!("{:?}", complete_request());
        assert!(!debug_output.contains("battery"));
    }
}
