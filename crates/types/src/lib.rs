//! Validated primitive types shared across the clinic crates.
//!
//! Each type here can only be constructed from input that already passed its check, so
//! holders never need to re-validate:
//! - [`NonEmptyText`] for required free-text fields
//! - [`Cpf`] for the Brazilian taxpayer id (checksum validated)
//! - [`PhoneNumber`] for 10 or 11 digit phone numbers
//! - [`EmailAddress`] for contact emails
//!
//! The plain helper functions (`is_valid_cpf`, `format_phone`, ...) are exposed as well for
//! callers that only need a yes/no answer or a display mask.

mod cpf;
mod phone;

pub use cpf::{check_digit as cpf_check_digit, format_cpf, is_valid_cpf, Cpf};
pub use phone::{format_phone, is_valid_phone, PhoneNumber};

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    #[error("invalid CPF: {0}")]
    InvalidCpf(String),
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// Strips every character that is not an ASCII digit.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns true if `input` looks like a deliverable email address.
///
/// This is a shape check only: exactly one `@`, a non-empty local part and a domain that
/// contains a dot which is neither its first nor its last character.
pub fn is_valid_email(input: &str) -> bool {
    let input = input.trim();
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = input.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.find('.') {
        Some(idx) => idx > 0 && !domain.ends_with('.'),
        None => false,
    }
}

/// A contact email that passed [`is_valid_email`], stored trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref().trim();
        if !is_valid_email(input) {
            return Err(TextError::InvalidEmail(input.to_owned()));
        }
        Ok(Self(input.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Maria Silva ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Maria Silva");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"\"");
        assert!(result.is_err(), "empty JSON string should not deserialize");
    }

    #[test]
    fn digits_only_strips_punctuation() {
        assert_eq!(digits_only("(11) 98765-4321"), "11987654321");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("recepcao@clinica.com.br"));
        assert!(!is_valid_email("recepcao@clinica"));
        assert!(!is_valid_email("@clinica.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn email_address_is_lowercased() {
        let email = EmailAddress::parse(" Dra.Ana@Clinica.COM ").expect("valid email");
        assert_eq!(email.as_str(), "dra.ana@clinica.com");
    }
}
