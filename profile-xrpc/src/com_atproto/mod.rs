// com.atproto types (manually entered)

#[derive(Debug, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct SessionRequest {
    pub identifier: String,
    pub password: String,
}

/// Response to `com.atproto.server.createSession`.
///
/// The refresh token is ignored; sessions are used once and dropped.
#[allow(non_snake_case)]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub accessJwt: String,
    pub did: String,
    pub handle: String,
}

#[test]
fn test_session_ignores_refresh() {
    let session: Session = serde_json::from_str(
        r#"{"accessJwt": "tok", "refreshJwt": "ref", "did": "did:example:1234", "handle": "alice.test"}"#,
    )
    .unwrap();
    assert_eq!(session.accessJwt, "tok");
    assert_eq!(session.handle, "alice.test");

    // OAuth-style field names are not a session
    assert!(serde_json::from_str::<Session>(r#"{"access_token": "token123"}"#).is_err());
}
