use std::fmt;

/// Credentials of the service-owned account used to authenticate lookups, as stored in the
/// secret store: `{"username": ..., "password": ..., "did": ...}`
#[derive(serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UtilAccountCredentials {
    pub username: String,
    pub password: String,
    pub did: String,
}

impl fmt::Debug for UtilAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtilAccountCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("did", &self.did)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("util account credentials are not valid JSON with username, password and did: {0}")]
    Format(#[from] serde_json::Error),

    #[error("util account credentials have an empty {0}")]
    Empty(&'static str),
}

impl UtilAccountCredentials {
    /// Parses the raw secret payload. Missing or empty username/password is an error, never
    /// passed downstream as blank credentials.
    pub fn decode(secret_payload: &str) -> Result<Self, DecodeError> {
        let creds: UtilAccountCredentials = serde_json::from_str(secret_payload)?;
        if creds.username.is_empty() {
            return Err(DecodeError::Empty("username"));
        }
        if creds.password.is_empty() {
            return Err(DecodeError::Empty("password"));
        }
        Ok(creds)
    }
}

#[test]
fn test_decode() {
    let creds = UtilAccountCredentials::decode(
        r#"{"username": "util.example.com", "password": "hunter2", "did": "did:example:util"}"#,
    )
    .unwrap();
    assert_eq!(creds.username, "util.example.com");
    assert_eq!(creds.password, "hunter2");
    assert_eq!(creds.did, "did:example:util");

    // extra keys in the secret are fine
    assert!(UtilAccountCredentials::decode(
        r#"{"username": "u", "password": "p", "did": "did:example:util", "note": "rotated"}"#
    )
    .is_ok());
}

#[test]
fn test_decode_rejects() {
    assert!(matches!(
        UtilAccountCredentials::decode("not json"),
        Err(DecodeError::Format(_))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(""),
        Err(DecodeError::Format(_))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(r#"["username", "password"]"#),
        Err(DecodeError::Format(_))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(r#"{"username": "u", "did": "did:example:util"}"#),
        Err(DecodeError::Format(_))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(r#"{"password": "p", "did": "did:example:util"}"#),
        Err(DecodeError::Format(_))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(
            r#"{"username": "", "password": "p", "did": "did:example:util"}"#
        ),
        Err(DecodeError::Empty("username"))
    ));
    assert!(matches!(
        UtilAccountCredentials::decode(
            r#"{"username": "u", "password": "", "did": "did:example:util"}"#
        ),
        Err(DecodeError::Empty("password"))
    ));
}

#[test]
fn test_debug_redacts_password() {
    let creds = UtilAccountCredentials::decode(
        r#"{"username": "util.example.com", "password": "hunter2", "did": "did:example:util"}"#,
    )
    .unwrap();
    let out = format!("{creds:?}");
    assert!(out.contains("util.example.com"));
    assert!(!out.contains("hunter2"));
}
