//! CPF (Cadastro de Pessoas Físicas) checksum validation and masking.
//!
//! A CPF has nine base digits followed by two check digits. Check digit `n` (the 10th and
//! 11th digits) is computed over the `n` preceding digits with weights `n + 1` down to `2`:
//! `r = (sum * 10) % 11`, where a remainder of 10 maps to 0.

use crate::{digits_only, TextError};

const CPF_LEN: usize = 11;

/// The check digit that follows `digits`: pass the nine base digits for the first check
/// digit, then those plus the first check digit for the second.
pub fn check_digit(digits: &[u32]) -> u32 {
    let n = digits.len() as u32;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (n + 1 - i as u32))
        .sum();
    let r = (sum * 10) % 11;
    if r == 10 {
        0
    } else {
        r
    }
}

/// Returns true if `input` holds a CPF whose two check digits are correct.
///
/// Punctuation is ignored. Sequences of one repeated digit (e.g. `111.111.111-11`) pass the
/// arithmetic but are not issued, so they are rejected.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = digits_only(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != CPF_LEN {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Applies the `000.000.000-00` mask to whatever digits are present.
///
/// Partial input is masked progressively (`5299` → `529.9`) and anything past the 11th
/// digit is dropped.
pub fn format_cpf(input: &str) -> String {
    let digits: String = digits_only(input).chars().take(CPF_LEN).collect();
    let mut out = String::with_capacity(14);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// A checksum-valid CPF, stored as its 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if !is_valid_cpf(input) {
            return Err(TextError::InvalidCpf(input.trim().to_owned()));
        }
        Ok(Self(digits_only(input)))
    }

    /// The 11 digits without punctuation.
    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        format_cpf(&self.0)
    }
}

impl std::fmt::Display for Cpf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl serde::Serialize for Cpf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Cpf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cpf::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: [&str; 2] = ["52998224725", "11144477735"];

    #[test]
    fn check_digits_of_a_known_cpf() {
        let base = [5, 2, 9, 9, 8, 2, 2, 4, 7];
        assert_eq!(check_digit(&base), 2);
        assert_eq!(check_digit(&[5, 2, 9, 9, 8, 2, 2, 4, 7, 2]), 5);
        // Remainder 10 maps to 0.
        assert_eq!(check_digit(&[1, 2, 3, 4, 5, 6, 7, 8, 9]), 0);
    }

    #[test]
    fn accepts_known_valid_cpfs() {
        for cpf in VALID {
            assert!(is_valid_cpf(cpf), "{cpf} should be valid");
        }
        assert!(is_valid_cpf("529.982.247-25"), "mask should be ignored");
    }

    #[test]
    fn rejects_every_single_digit_mutation() {
        for cpf in VALID {
            for (pos, original) in cpf.char_indices() {
                for replacement in '0'..='9' {
                    if replacement == original {
                        continue;
                    }
                    let mut mutated = cpf.to_string();
                    mutated.replace_range(pos..pos + 1, &replacement.to_string());
                    assert!(
                        !is_valid_cpf(&mutated),
                        "{mutated} (mutated from {cpf} at {pos}) should be invalid"
                    );
                }
            }
        }
    }

    #[test]
    fn rejects_wrong_length_and_repeated_digits() {
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529982247250"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("00000000000"));
    }

    #[test]
    fn format_applies_progressive_mask() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("5299"), "529.9");
        assert_eq!(format_cpf("529982247"), "529.982.247");
        assert_eq!(format_cpf("5299822472599"), "529.982.247-25");
        assert_eq!(format_cpf(""), "");
    }

    #[test]
    fn cpf_type_stores_digits_and_displays_masked() {
        let cpf = Cpf::parse("529.982.247-25").expect("valid CPF");
        assert_eq!(cpf.digits(), "52998224725");
        assert_eq!(cpf.to_string(), "529.982.247-25");
        assert!(Cpf::parse("529.982.247-26").is_err());
    }
}
