use crate::profile::ProfileError;
use log::error;
use serde_json::Value;

#[derive(Debug, serde::Deserialize)]
struct RawProfileRequest {
    #[serde(default)]
    did: Option<String>,
}

/// Inbound lookup request, validated: `did` is present and not blank.
///
/// Any other fields in the event are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
    pub did: String,
}

impl ProfileRequest {
    pub fn from_event(event: Value) -> Result<Self, ProfileError> {
        let raw: RawProfileRequest = serde_json::from_value(event).map_err(|e| {
            error!("invalid request event: {}", e);
            ProfileError::InvalidRequest
        })?;
        match raw.did.map(|d| d.trim().to_string()) {
            Some(did) if !did.is_empty() => Ok(ProfileRequest { did }),
            _ => {
                error!("invalid request: missing 'did'");
                Err(ProfileError::InvalidRequest)
            }
        }
    }
}

#[test]
fn test_from_event() {
    use serde_json::json;

    assert_eq!(
        ProfileRequest::from_event(json!({"did": "did:example:1234", "source": "api"})).unwrap(),
        ProfileRequest {
            did: "did:example:1234".to_string()
        }
    );
    assert_eq!(
        ProfileRequest::from_event(json!({"did": " did:example:1234\n"}))
            .unwrap()
            .did,
        "did:example:1234"
    );

    for event in [
        json!({}),
        json!({"did": ""}),
        json!({"did": "   "}),
        json!({"did": null}),
        json!({"did": 1234}),
        json!({"handle": "alice.test"}),
        json!("did:example:1234"),
        json!(null),
    ] {
        assert_eq!(
            ProfileRequest::from_event(event),
            Err(ProfileError::InvalidRequest)
        );
    }
}
