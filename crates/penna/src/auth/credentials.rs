//! Login and registration credential types.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::AuthError;

/// Characters accepted as the "special character" of a password.
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Login credentials for the token endpoint.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use penna::Credentials;
///
/// let creds = Credentials::new("ana", "Abc12345!");
/// assert_eq!(creds.username(), "ana");
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Account registration data.
///
/// Registration never establishes a session by itself; the session manager
/// logs in with [`Registration::credentials`] afterwards.
#[derive(Clone, serde::Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(rename = "password2")]
    pub password_confirmation: String,
}

impl Registration {
    /// The credentials to log in with once the account exists.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    /// Check the fields before sending them to the API.
    ///
    /// Errors are keyed by wire field name, the same way the API reports
    /// them, so callers can render both kinds identically.
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut fail = |field: &str, message: &str| {
            fields
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        let username_len = self.username.trim().chars().count();
        if username_len == 0 {
            fail("username", "Username is required");
        } else if username_len < 3 {
            fail("username", "Username must be at least 3 characters");
        } else if username_len > 30 {
            fail("username", "Username must be less than 30 characters");
        }

        if self.email.trim().is_empty() {
            fail("email", "Email is required");
        } else if !looks_like_email(self.email.trim()) {
            fail("email", "Invalid email address");
        }

        if self.first_name.trim().is_empty() {
            fail("first_name", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            fail("last_name", "Last name is required");
        }

        if self.password.is_empty() {
            fail("password", "Password is required");
        } else {
            if self.password.chars().count() < 8 {
                fail("password", "Password must be at least 8 characters");
            }
            if !self.password.chars().any(|c| c.is_ascii_lowercase()) {
                fail("password", "Password must contain at least one lowercase letter");
            }
            if !self.password.chars().any(|c| c.is_ascii_uppercase()) {
                fail("password", "Password must contain at least one uppercase letter");
            }
            if !self.password.chars().any(|c| c.is_ascii_digit()) {
                fail("password", "Password must contain at least one number");
            }
            if !self.password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
                fail("password", "Password must contain at least one special character");
            }
        }

        if self.password_confirmation.is_empty() {
            fail("password2", "Password confirmation is required");
        } else if self.password_confirmation != self.password {
            fail("password2", "Passwords must match");
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation {
                message: aggregate_field_errors(&fields),
                fields,
            })
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Join per-field messages into one line: `field: a, b; other: c`.
pub(crate) fn aggregate_field_errors(fields: &BTreeMap<String, Vec<String>>) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect();
    format!("Registration failed: {}", parts.join("; "))
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Registration {
        Registration {
            username: "ana".into(),
            email: "ana@x.com".into(),
            first_name: "Ana".into(),
            last_name: "Lee".into(),
            password: "Abc12345!".into(),
            password_confirmation: "Abc12345!".into(),
        }
    }

    fn field_errors(registration: &Registration) -> BTreeMap<String, Vec<String>> {
        match registration.validate() {
            Err(AuthError::Validation { fields, .. }) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn credentials_hides_password_in_debug() {
        let creds = Credentials::new("ana", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ana"));
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn registration_hides_passwords_in_debug() {
        let debug = format!("{:?}", ana());
        assert!(!debug.contains("Abc12345!"));
    }

    #[test]
    fn valid_registration_passes() {
        assert!(ana().validate().is_ok());
    }

    #[test]
    fn registration_serializes_confirmation_as_password2() {
        let json = serde_json::to_value(ana()).unwrap();
        assert_eq!(json["password2"], "Abc12345!");
        assert!(json.get("password_confirmation").is_none());
    }

    #[test]
    fn weak_password_lists_every_rule() {
        let mut reg = ana();
        reg.password = "abc".into();
        reg.password_confirmation = "abc".into();
        let fields = field_errors(&reg);
        let password = &fields["password"];
        assert_eq!(password.len(), 4);
        assert!(password.iter().any(|m| m.contains("8 characters")));
        assert!(password.iter().any(|m| m.contains("uppercase")));
        assert!(!fields.contains_key("password2"));
    }

    #[test]
    fn mismatched_confirmation() {
        let mut reg = ana();
        reg.password_confirmation = "Abc12345?".into();
        let fields = field_errors(&reg);
        assert_eq!(fields["password2"], vec!["Passwords must match"]);
    }

    #[test]
    fn aggregated_message_covers_all_fields() {
        let mut reg = ana();
        reg.username = "an".into();
        reg.email = "not-an-email".into();
        match reg.validate() {
            Err(AuthError::Validation { message, .. }) => {
                assert_eq!(
                    message,
                    "Registration failed: email: Invalid email address; \
                     username: Username must be at least 3 characters"
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("ana@x.com"));
        assert!(!looks_like_email("ana@x"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("ana@@x.com"));
        assert!(!looks_like_email("ana @x.com"));
    }
}
