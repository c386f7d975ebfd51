use thiserror::Error;

/// Request header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the expected one.
///
/// When no key is expected the check is disabled and every request passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match provided {
        None => Err(AuthError::Missing),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_expected_key_disables_the_check() {
        assert_eq!(validate_api_key(None, None), Ok(()));
        assert_eq!(validate_api_key(None, Some("anything")), Ok(()));
    }

    #[test]
    fn matching_key_passes() {
        assert_eq!(validate_api_key(Some("k3y"), Some("k3y")), Ok(()));
    }

    #[test]
    fn missing_or_wrong_key_is_rejected() {
        assert_eq!(validate_api_key(Some("k3y"), None), Err(AuthError::Missing));
        assert_eq!(
            validate_api_key(Some("k3y"), Some("other")),
            Err(AuthError::Invalid)
        );
    }
}
