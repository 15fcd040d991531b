use mockito::Matcher;
use profile_service::*;
use profile_xrpc::{Session, XrpcError};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

const CREDS: &str =
    r#"{"username": "util.example.com", "password": "hunter2", "did": "did:example:util"}"#;

fn test_config(base_url: &str) -> Config {
    Config {
        atproto_base_url: base_url.to_string(),
        util_account_secret_name: "test/util-account".to_string(),
    }
}

struct MissingConfig;

impl ConfigSource for MissingConfig {
    fn load(&self) -> Result<Config, ConfigError> {
        Err(ConfigError::Missing("ATPROTO_BASE_URL"))
    }
}

/// Secret store fake which records every name asked for
#[derive(Clone)]
struct FakeSecrets {
    payload: Result<String, ()>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl FakeSecrets {
    fn returning(payload: &str) -> Self {
        FakeSecrets {
            payload: Ok(payload.to_string()),
            calls: Default::default(),
        }
    }

    fn failing() -> Self {
        FakeSecrets {
            payload: Err(()),
            calls: Default::default(),
        }
    }
}

impl SecretResolver for FakeSecrets {
    fn resolve(&self, name: &str) -> Result<String, SecretError> {
        self.calls.borrow_mut().push(name.to_string());
        self.payload.clone().map_err(|_| SecretError::Store {
            name: name.to_string(),
            reason: "AccessDeniedException".to_string(),
        })
    }
}

#[derive(Clone, Copy)]
enum Reply {
    Ok,
    Status(u16),
    Garbled,
}

fn reply_error(nsid: &str, status: u16) -> XrpcError {
    XrpcError::Status {
        nsid: nsid.to_string(),
        status,
        error: Some("UpstreamFailure".to_string()),
        message: Some("secret upstream detail".to_string()),
    }
}

/// In-memory stand-in for the XRPC service; logs calls in order
#[derive(Clone)]
struct FakeApi {
    session: Reply,
    profile: Reply,
    profile_body: serde_json::Value,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ProfileApi for FakeApi {
    fn create_session(&self, identifier: &str, password: &str) -> Result<Session, XrpcError> {
        self.calls
            .borrow_mut()
            .push(format!("createSession {identifier} {password}"));
        match self.session {
            Reply::Ok => Ok(Session {
                accessJwt: "tok".to_string(),
                did: "did:example:util".to_string(),
                handle: "util.example.com".to_string(),
            }),
            Reply::Status(s) => Err(reply_error("com.atproto.server.createSession", s)),
            Reply::Garbled => Err(serde_json::from_str::<Session>("{}").unwrap_err().into()),
        }
    }

    fn get_profile(&self, did: &str, access_jwt: &str) -> Result<ProfileRecord, XrpcError> {
        self.calls
            .borrow_mut()
            .push(format!("getProfile {did} {access_jwt}"));
        match self.profile {
            Reply::Ok => Ok(serde_json::from_value(self.profile_body.clone())?),
            Reply::Status(s) => Err(reply_error("app.bsky.actor.getProfile", s)),
            Reply::Garbled => Err(serde_json::from_str::<ProfileRecord>("[]")
                .unwrap_err()
                .into()),
        }
    }
}

impl Connector for FakeApi {
    type Api = FakeApi;

    fn connect(&self, base_url: &str) -> FakeApi {
        self.calls.borrow_mut().push(format!("connect {base_url}"));
        self.clone()
    }
}

fn fake_api(session: Reply, profile: Reply) -> FakeApi {
    FakeApi {
        session,
        profile,
        profile_body: json!({
            "did": "did:example:1234",
            "displayName": "Alice",
            "handle": "alice.test",
        }),
        calls: Default::default(),
    }
}

#[test]
fn test_full_lookup_order() {
    let secrets = FakeSecrets::returning(CREDS);
    let api = fake_api(Reply::Ok, Reply::Ok);
    let service = ProfileService::new(
        test_config("https://pds.example.com"),
        secrets.clone(),
        api.clone(),
    );

    let profile = service.get_profile_for_did("did:example:1234").unwrap();
    assert_eq!(profile.did, "did:example:1234");
    assert_eq!(profile.displayName.as_deref(), Some("Alice"));

    assert_eq!(*secrets.calls.borrow(), vec!["test/util-account"]);
    assert_eq!(
        *api.calls.borrow(),
        vec![
            "connect https://pds.example.com",
            "createSession util.example.com hunter2",
            "getProfile did:example:1234 tok",
        ]
    );
}

#[test]
fn test_empty_did_makes_no_calls() {
    for did in ["", " ", "\t\n"] {
        let secrets = FakeSecrets::returning(CREDS);
        let api = fake_api(Reply::Ok, Reply::Ok);
        let service = ProfileService::new(
            test_config("https://pds.example.com"),
            secrets.clone(),
            api.clone(),
        );
        assert_eq!(
            service.get_profile_for_did(did),
            Err(ProfileError::InvalidRequest)
        );
        assert!(secrets.calls.borrow().is_empty());
        assert!(api.calls.borrow().is_empty());
    }
}

#[test]
fn test_handle_event() {
    let api = fake_api(Reply::Ok, Reply::Ok);
    let service = ProfileService::new(
        test_config("https://pds.example.com"),
        FakeSecrets::returning(CREDS),
        api.clone(),
    );

    let profile = service
        .handle_event(json!({"did": "did:example:1234", "ignored": true}))
        .unwrap();
    assert_eq!(profile.handle, "alice.test");

    assert_eq!(
        service.handle_event(json!({"did": ""})),
        Err(ProfileError::InvalidRequest)
    );
    assert_eq!(
        service.handle_event(json!({"user": "did:example:1234"})),
        Err(ProfileError::InvalidRequest)
    );
    assert_eq!(api.calls.borrow().len(), 3);
}

#[test]
fn test_missing_config() {
    let secrets = FakeSecrets::returning(CREDS);
    let api = fake_api(Reply::Ok, Reply::Ok);
    let service = ProfileService::new(MissingConfig, secrets.clone(), api.clone());

    let err = service.get_profile_for_did("did:example:1234").unwrap_err();
    assert_eq!(err, ProfileError::Configuration);
    assert_eq!(err.to_string(), "internal server error");
    assert!(secrets.calls.borrow().is_empty());
    assert!(api.calls.borrow().is_empty());
}

#[test]
fn test_secret_failure_short_circuits() {
    let api = fake_api(Reply::Ok, Reply::Ok);
    let service = ProfileService::new(
        test_config("https://pds.example.com"),
        FakeSecrets::failing(),
        api.clone(),
    );

    let err = service.get_profile_for_did("did:example:1234").unwrap_err();
    assert_eq!(err, ProfileError::CredentialRetrieval);
    assert!(!err.to_string().contains("test/util-account"));
    assert!(!err.to_string().contains("AccessDenied"));
    assert!(api.calls.borrow().is_empty());
}

#[test]
fn test_malformed_credentials() {
    for payload in [
        "not json",
        r#"{"username": "util.example.com", "did": "did:example:util"}"#,
        r#"{"username": "util.example.com", "password": "", "did": "did:example:util"}"#,
    ] {
        let api = fake_api(Reply::Ok, Reply::Ok);
        let service = ProfileService::new(
            test_config("https://pds.example.com"),
            FakeSecrets::returning(payload),
            api.clone(),
        );
        assert_eq!(
            service.get_profile_for_did("did:example:1234"),
            Err(ProfileError::CredentialFormat)
        );
        assert!(api.calls.borrow().is_empty());
    }
}

#[test]
fn test_session_failures_are_generic() {
    for reply in [
        Reply::Status(401),
        Reply::Status(400),
        Reply::Status(500),
        Reply::Garbled,
    ] {
        let api = fake_api(reply, Reply::Ok);
        let service = ProfileService::new(
            test_config("https://pds.example.com"),
            FakeSecrets::returning(CREDS),
            api.clone(),
        );

        let err = service.get_profile_for_did("did:example:1234").unwrap_err();
        assert_eq!(err, ProfileError::Authentication);
        let msg = err.to_string();
        for leak in ["401", "400", "500", "UpstreamFailure", "secret upstream detail", "hunter2"] {
            assert!(!msg.contains(leak), "leaked {leak} in {msg}");
        }
        // no profile fetch once the session failed
        assert_eq!(api.calls.borrow().len(), 2);
    }
}

#[test]
fn test_profile_failures() {
    for status in [400, 401, 404, 502] {
        let api = fake_api(Reply::Ok, Reply::Status(status));
        let service = ProfileService::new(
            test_config("https://pds.example.com"),
            FakeSecrets::returning(CREDS),
            api,
        );
        let err = service.get_profile_for_did("did:example:1234").unwrap_err();
        assert_eq!(
            err,
            ProfileError::ProfileLookup {
                did: "did:example:1234".to_string()
            }
        );
        assert_eq!(err.to_string(), "profile not found for did:example:1234");
    }

    let api = fake_api(Reply::Ok, Reply::Garbled);
    let service = ProfileService::new(
        test_config("https://pds.example.com"),
        FakeSecrets::returning(CREDS),
        api,
    );
    let err = service.get_profile_for_did("did:example:1234").unwrap_err();
    assert_eq!(
        err,
        ProfileError::ProfileNotFound {
            did: "did:example:1234".to_string()
        }
    );
    assert_eq!(err.to_string(), "profile not found for did:example:1234");
}

#[test]
fn test_blank_profile_is_not_found() {
    let mut api = fake_api(Reply::Ok, Reply::Ok);
    api.profile_body = json!({"did": "", "handle": ""});
    let service = ProfileService::new(
        test_config("https://pds.example.com"),
        FakeSecrets::returning(CREDS),
        api,
    );
    assert_eq!(
        service.get_profile_for_did("did:example:1234"),
        Err(ProfileError::ProfileNotFound {
            did: "did:example:1234".to_string()
        })
    );
}

fn mock_session(server: &mut mockito::Server, status: usize, body: &str) -> mockito::Mock {
    server
        .mock("POST", "/xrpc/com.atproto.server.createSession")
        .match_body(Matcher::Json(json!({
            "identifier": "util.example.com",
            "password": "hunter2",
        })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

#[test]
fn test_xrpc_lookup() {
    let mut server = mockito::Server::new();
    let session_mock = mock_session(
        &mut server,
        200,
        r#"{"accessJwt": "tok", "did": "did:example:1234", "handle": "alice.test"}"#,
    );
    let profile_body = json!({
        "did": "did:example:1234",
        "displayName": "Alice",
        "handle": "alice.test",
    });
    let profile_mock = server
        .mock("GET", "/xrpc/app.bsky.actor.getProfile")
        .match_query(Matcher::UrlEncoded(
            "actor".to_string(),
            "did:example:1234".to_string(),
        ))
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profile_body.to_string())
        .create();

    let service = ProfileService::new(
        test_config(&server.url()),
        FakeSecrets::returning(CREDS),
        XrpcConnector::new().unwrap(),
    );
    let profile = service.get_profile_for_did("did:example:1234").unwrap();
    session_mock.assert();
    profile_mock.assert();

    assert_eq!(serde_json::to_value(&profile).unwrap(), profile_body);
}

#[test]
fn test_xrpc_unauthorized() {
    let mut server = mockito::Server::new();
    let session_mock = mock_session(
        &mut server,
        401,
        r#"{"error": "AuthenticationRequired", "message": "Invalid identifier or password"}"#,
    );
    let profile_mock = server
        .mock("GET", "/xrpc/app.bsky.actor.getProfile")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let service = ProfileService::new(
        test_config(&server.url()),
        FakeSecrets::returning(CREDS),
        XrpcConnector::new().unwrap(),
    );
    let err = service.get_profile_for_did("did:example:1234").unwrap_err();
    session_mock.assert();
    profile_mock.assert();

    assert_eq!(err, ProfileError::Authentication);
    assert!(!err.to_string().contains("401"));
    assert!(!err.to_string().contains("Invalid identifier"));
}

#[test]
fn test_xrpc_profile_missing() {
    let mut server = mockito::Server::new();
    let _session_mock = mock_session(
        &mut server,
        200,
        r#"{"accessJwt": "tok", "did": "did:example:util", "handle": "util.example.com"}"#,
    );
    let _profile_mock = server
        .mock("GET", "/xrpc/app.bsky.actor.getProfile")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "InvalidRequest", "message": "Profile not found"}"#)
        .create();

    let service = ProfileService::new(
        test_config(&server.url()),
        FakeSecrets::returning(CREDS),
        XrpcConnector::new().unwrap(),
    );
    assert_eq!(
        service.get_profile_for_did("did:example:nobody"),
        Err(ProfileError::ProfileLookup {
            did: "did:example:nobody".to_string()
        })
    );
}

#[test]
fn test_xrpc_empty_profile_body() {
    let mut server = mockito::Server::new();
    let _session_mock = mock_session(
        &mut server,
        200,
        r#"{"accessJwt": "tok", "did": "did:example:util", "handle": "util.example.com"}"#,
    );
    let _profile_mock = server
        .mock("GET", "/xrpc/app.bsky.actor.getProfile")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create();

    let service = ProfileService::new(
        test_config(&server.url()),
        FakeSecrets::returning(CREDS),
        XrpcConnector::new().unwrap(),
    );
    assert_eq!(
        service.get_profile_for_did("did:example:1234"),
        Err(ProfileError::ProfileNotFound {
            did: "did:example:1234".to_string()
        })
    );
}
