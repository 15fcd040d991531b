//! app.bsky types (manually entered)
//!
//! Optional fields stay `None` when the upstream omits them, and are skipped when serializing,
//! so a profile passes through this service with the same shape it arrived in.

use serde_json::Value;

/// `com.atproto.repo.strongRef`, used here for pinned posts
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

/// `com.atproto.label.defs#label`
///
/// Field names are the compact wire names: version, source, value, negated, created and expiry
/// timestamps, and signature.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Label {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<String>,
    // bytes, as `{"$bytes": "<base64>"}` in JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<Value>,
}

/// Moderation list the viewer muted this account through (`app.bsky.graph.defs#listViewBasic`)
#[allow(non_snake_case)]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct MuteListEntry {
    pub uri: String,
    pub cid: String,
    pub name: String,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexedAt: Option<String>,
}

/// Relationship of the authenticated (utility) account to the profile
#[allow(non_snake_case)]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Viewer {
    // some AppView versions leave this out instead of sending false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutedByList: Option<Vec<MuteListEntry>>,
}

/// `app.bsky.actor.defs#profileViewDetailed`, as returned by `app.bsky.actor.getProfile`
#[allow(non_snake_case)]
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub did: String,
    // accounts which never set a display name don't get one in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayName: Option<String>,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followersCount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followsCount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postsCount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinnedPost: Option<StrongRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexedAt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub createdAt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<Viewer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
}

impl ProfileRecord {
    /// True if the upstream answered without identifying anybody (blank DID)
    pub fn is_empty(&self) -> bool {
        self.did.trim().is_empty()
    }
}

#[test]
fn test_profile_minimal() {
    let val = serde_json::json!({
        "did": "did:example:1234",
        "displayName": "Alice",
        "handle": "alice.test",
    });
    let profile: ProfileRecord = serde_json::from_value(val.clone()).unwrap();
    assert_eq!(profile.displayName.as_deref(), Some("Alice"));
    assert_eq!(profile.description, None);
    assert_eq!(profile.labels, None);
    assert!(!profile.is_empty());
    assert_eq!(serde_json::to_value(&profile).unwrap(), val);
}

#[test]
fn test_profile_empty_vs_omitted() {
    // an empty description is kept distinct from a missing one
    let profile: ProfileRecord = serde_json::from_str(
        r#"{"did": "did:example:1234", "handle": "alice.test", "description": "", "labels": []}"#,
    )
    .unwrap();
    assert_eq!(profile.description.as_deref(), Some(""));
    assert_eq!(profile.labels, Some(vec![]));
    assert_eq!(profile.displayName, None);

    let out = serde_json::to_value(&profile).unwrap();
    assert_eq!(out["description"], "");
    assert!(out.get("displayName").is_none());
    assert!(out.get("avatar").is_none());
}

#[test]
fn test_profile_requires_identity() {
    assert!(serde_json::from_str::<ProfileRecord>("{}").is_err());
    assert!(serde_json::from_str::<ProfileRecord>(r#"{"did": "did:example:1234"}"#).is_err());

    let blank: ProfileRecord =
        serde_json::from_str(r#"{"did": " ", "handle": "handle.invalid"}"#).unwrap();
    assert!(blank.is_empty());
}

#[test]
fn test_profile_viewer_passthrough() {
    let val = serde_json::json!({
        "did": "did:example:1234",
        "displayName": "Alice",
        "handle": "alice.test",
        "viewer": {},
    });
    let profile: ProfileRecord = serde_json::from_value(val.clone()).unwrap();
    assert_eq!(profile.viewer.as_ref().unwrap().muted, None);
    assert_eq!(serde_json::to_value(&profile).unwrap(), val);

    let val = serde_json::json!({
        "did": "did:example:1234",
        "handle": "alice.test",
        "viewer": {"muted": false},
    });
    let profile: ProfileRecord = serde_json::from_value(val.clone()).unwrap();
    assert_eq!(profile.viewer.as_ref().unwrap().muted, Some(false));
    assert_eq!(serde_json::to_value(&profile).unwrap(), val);
}

#[test]
fn test_label() {
    let label: Label = serde_json::from_str(
        r#"{"ver": 1, "src": "did:plc:ar7c4by46qjdydhdevvrndac", "uri": "did:example:1234", "val": "!hide", "neg": false, "cts": "2024-05-01T12:00:00.000Z", "sig": {"$bytes": "c2lnbmF0dXJl"}}"#,
    )
    .unwrap();
    assert_eq!(label.ver, Some(1));
    assert_eq!(label.val.as_deref(), Some("!hide"));
    assert_eq!(label.neg, Some(false));
    assert_eq!(label.exp, None);
    assert_eq!(label.sig.unwrap()["$bytes"], "c2lnbmF0dXJl");
}
