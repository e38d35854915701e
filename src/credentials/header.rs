//! `Authorization` header parsing.

use crate::error::AuthError;
use base64ct::{Base64, Encoding};
use secrecy::SecretString;

#[derive(Debug)]
pub enum Credentials {
    Basic {
        username: String,
        password: SecretString,
    },
    Bearer(SecretString),
}

/// Split an `Authorization` header value into Basic or Bearer credentials.
///
/// # Errors
/// - `MissingCredentials` when the header is absent or blank
/// - `InvalidCredentials` for malformed Basic credentials
/// - `InvalidToken` for a Bearer header without a token
/// - `UnsupportedScheme` for any other scheme
pub fn parse_authorization(header: Option<&str>) -> Result<Credentials, AuthError> {
    let header = header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));

    match scheme {
        "Basic" => parse_basic(rest.trim()),
        "Bearer" => {
            let token = rest.trim();
            if token.is_empty() {
                return Err(AuthError::InvalidToken(
                    "no token provided in Bearer authorization".to_string(),
                ));
            }
            Ok(Credentials::Bearer(SecretString::from(token.to_string())))
        }
        _ => Err(AuthError::UnsupportedScheme),
    }
}

fn parse_basic(encoded: &str) -> Result<Credentials, AuthError> {
    let invalid = || AuthError::InvalidCredentials("invalid Basic credentials".to_string());

    let decoded = Base64::decode_vec(encoded).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;
    let (username, password) = decoded.split_once(':').ok_or_else(invalid)?;

    Ok(Credentials::Basic {
        username: username.to_string(),
        password: SecretString::from(password.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", Base64::encode_string(user_pass.as_bytes()))
    }

    #[test]
    fn parses_basic_credentials() {
        let header = basic("readuser:readpass");
        match parse_authorization(Some(&header)) {
            Ok(Credentials::Basic { username, password }) => {
                assert_eq!(username, "readuser");
                assert_eq!(password.expose_secret(), "readpass");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn password_may_contain_colons() {
        let header = basic("svc:pa:ss");
        match parse_authorization(Some(&header)) {
            Ok(Credentials::Basic { username, password }) => {
                assert_eq!(username, "svc");
                assert_eq!(password.expose_secret(), "pa:ss");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parses_bearer_token() {
        match parse_authorization(Some("Bearer abc.def.ghi")) {
            Ok(Credentials::Bearer(token)) => assert_eq!(token.expose_secret(), "abc.def.ghi"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_header() {
        assert!(matches!(
            parse_authorization(None),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            parse_authorization(Some("   ")),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn empty_bearer_is_invalid_token() {
        assert!(matches!(
            parse_authorization(Some("Bearer    ")),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn malformed_basic_is_invalid_credentials() {
        assert!(matches!(
            parse_authorization(Some("Basic !!!not-base64")),
            Err(AuthError::InvalidCredentials(_))
        ));
        let no_colon = basic("readuser");
        assert!(matches!(
            parse_authorization(Some(&no_colon)),
            Err(AuthError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn other_schemes_are_unsupported() {
        assert!(matches!(
            parse_authorization(Some("Digest username=\"x\"")),
            Err(AuthError::UnsupportedScheme)
        ));
    }
}
