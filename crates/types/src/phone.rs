//! Brazilian phone numbers: two-digit area code plus an 8 digit landline or 9 digit mobile.

use crate::{digits_only, TextError};

/// True iff the digit-only form of `input` has 10 or 11 digits.
pub fn is_valid_phone(input: &str) -> bool {
    matches!(digits_only(input).len(), 10 | 11)
}

/// Masks a phone number as `(00) 0000-0000` or `(00) 00000-0000`.
///
/// Partial input is masked as far as it goes; digits past the 11th are dropped.
pub fn format_phone(input: &str) -> String {
    let digits: Vec<char> = digits_only(input).chars().take(11).collect();
    let mut out = String::with_capacity(15);
    if digits.is_empty() {
        return out;
    }

    let area: String = digits.iter().take(2).collect();
    out.push('(');
    out.push_str(&area);
    if digits.len() <= 2 {
        return out;
    }
    out.push_str(") ");

    let rest = &digits[2..];
    // Mobile numbers carry an extra leading digit in the first group.
    let split = if digits.len() == 11 { 5 } else { 4 };
    for (i, c) in rest.iter().enumerate() {
        if i == split {
            out.push('-');
        }
        out.push(*c);
    }
    out
}

/// A phone number that passed [`is_valid_phone`], stored as digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if !is_valid_phone(input) {
            return Err(TextError::InvalidPhone(input.trim().to_owned()));
        }
        Ok(Self(digits_only(input)))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn is_mobile(&self) -> bool {
        self.0.len() == 11
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_phone(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_iff_ten_or_eleven_digits() {
        assert!(is_valid_phone("(11) 3456-7890"));
        assert!(is_valid_phone("11987654321"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("119876543210"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn formats_landline_and_mobile() {
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
    }

    #[test]
    fn formats_partial_input() {
        assert_eq!(format_phone("1"), "(1");
        assert_eq!(format_phone("11"), "(11");
        assert_eq!(format_phone("11345"), "(11) 345");
        assert_eq!(format_phone("113456789"), "(11) 3456-789");
    }

    #[test]
    fn phone_number_keeps_digits() {
        let phone = PhoneNumber::parse("(11) 98765-4321").expect("valid phone");
        assert_eq!(phone.digits(), "11987654321");
        assert!(phone.is_mobile());
        assert_eq!(phone.to_string(), "(11) 98765-4321");
    }
}
