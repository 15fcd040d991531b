use crate::config::ConfigSource;
use crate::credentials::UtilAccountCredentials;
use crate::request::ProfileRequest;
use crate::secrets::SecretResolver;
use log::{debug, error, info};
use profile_xrpc::{build_http_client, ProfileRecord, Session, XrpcClient, XrpcError};
use serde_json::Value;

/// Errors that cross the service boundary.
///
/// Messages are safe to hand back to callers: no upstream status codes, bodies, or secret
/// names. Detail goes to the log where each failure happens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("invalid request: missing 'did'")]
    InvalidRequest,

    #[error("internal server error")]
    Configuration,

    #[error("internal server error")]
    CredentialRetrieval,

    #[error("internal server error")]
    CredentialFormat,

    #[error("authentication with identity service failed")]
    Authentication,

    #[error("profile not found for {did}")]
    ProfileLookup { did: String },

    #[error("profile not found for {did}")]
    ProfileNotFound { did: String },
}

impl ProfileError {
    /// Stable name of the error kind, for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            ProfileError::InvalidRequest => "InvalidRequest",
            ProfileError::Configuration => "ConfigurationError",
            ProfileError::CredentialRetrieval => "CredentialRetrievalError",
            ProfileError::CredentialFormat => "CredentialFormatError",
            ProfileError::Authentication => "AuthenticationError",
            ProfileError::ProfileLookup { .. } => "ProfileLookupError",
            ProfileError::ProfileNotFound { .. } => "ProfileNotFound",
        }
    }
}

/// The two XRPC calls a lookup needs
pub trait ProfileApi {
    fn create_session(&self, identifier: &str, password: &str) -> Result<Session, XrpcError>;
    fn get_profile(&self, did: &str, access_jwt: &str) -> Result<ProfileRecord, XrpcError>;
}

impl ProfileApi for XrpcClient {
    fn create_session(&self, identifier: &str, password: &str) -> Result<Session, XrpcError> {
        XrpcClient::create_session(self, identifier, password)
    }

    fn get_profile(&self, did: &str, access_jwt: &str) -> Result<ProfileRecord, XrpcError> {
        XrpcClient::get_profile(self, did, access_jwt)
    }
}

/// Turns the configured base URL into a `ProfileApi`. The base URL is only known once config
/// has been loaded for the invocation.
pub trait Connector {
    type Api: ProfileApi;

    fn connect(&self, base_url: &str) -> Self::Api;
}

/// Connects `XrpcClient`s which all share one HTTP client
#[derive(Debug, Clone)]
pub struct XrpcConnector {
    http_client: reqwest::blocking::Client,
}

impl XrpcConnector {
    pub fn new() -> Result<Self, XrpcError> {
        Ok(XrpcConnector {
            http_client: build_http_client()?,
        })
    }
}

impl Connector for XrpcConnector {
    type Api = XrpcClient;

    fn connect(&self, base_url: &str) -> XrpcClient {
        debug!("connecting XRPC client host={}", base_url);
        XrpcClient::with_http_client(base_url, self.http_client.clone())
    }
}

/// Answers profile lookups: load config, fetch and decode the util account credentials, create
/// a session, fetch the profile. Every step runs afresh per call and the first failure ends it.
pub struct ProfileService<C, S, X> {
    config: C,
    secrets: S,
    connector: X,
}

impl<C, S, X> ProfileService<C, S, X>
where
    C: ConfigSource,
    S: SecretResolver,
    X: Connector,
{
    pub fn new(config: C, secrets: S, connector: X) -> Self {
        ProfileService {
            config,
            secrets,
            connector,
        }
    }

    /// Entry point for a raw invocation payload, like `{"did": "did:plc:..."}`
    pub fn handle_event(&self, event: Value) -> Result<ProfileRecord, ProfileError> {
        let request = ProfileRequest::from_event(event)?;
        self.get_profile_for_did(&request.did)
    }

    pub fn get_profile_for_did(&self, did: &str) -> Result<ProfileRecord, ProfileError> {
        let did = did.trim();
        if did.is_empty() {
            error!("invalid request: missing 'did'");
            return Err(ProfileError::InvalidRequest);
        }
        info!("processing profile retrieval request did={}", did);

        let config = self.config.load().map_err(|e| {
            error!("failed to load application configuration: {}", e);
            ProfileError::Configuration
        })?;

        let payload = self
            .secrets
            .resolve(&config.util_account_secret_name)
            .map_err(|e| {
                error!(
                    "unable to retrieve util account credentials secret_name={:?}: {}",
                    config.util_account_secret_name, e
                );
                ProfileError::CredentialRetrieval
            })?;

        // the payload itself never gets logged
        let creds = UtilAccountCredentials::decode(&payload).map_err(|e| {
            error!(
                "invalid util account credentials format secret_name={:?}: {}",
                config.util_account_secret_name, e
            );
            ProfileError::CredentialFormat
        })?;
        debug!("retrieved util account credentials username={}", creds.username);

        let api = self.connector.connect(&config.atproto_base_url);

        let session = api
            .create_session(&creds.username, &creds.password)
            .map_err(|e| {
                if e.is_auth_failure() {
                    error!(
                        "util account credentials rejected identifier={}: {}",
                        creds.username, e
                    );
                } else {
                    error!(
                        "failed to create session host={} identifier={}: {}",
                        config.atproto_base_url, creds.username, e
                    );
                }
                ProfileError::Authentication
            })?;

        let profile = api.get_profile(did, &session.accessJwt).map_err(|e| match e {
            XrpcError::Decode(inner) => {
                error!("profile response did not parse did={}: {}", did, inner);
                ProfileError::ProfileNotFound {
                    did: did.to_string(),
                }
            }
            e => {
                error!("failed to get profile did={}: {}", did, e);
                ProfileError::ProfileLookup {
                    did: did.to_string(),
                }
            }
        })?;

        if profile.is_empty() {
            error!("empty profile returned did={}", did);
            return Err(ProfileError::ProfileNotFound {
                did: did.to_string(),
            });
        }

        info!(
            "successfully retrieved profile did={} handle={}",
            profile.did, profile.handle
        );
        Ok(profile)
    }
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ProfileError::InvalidRequest.to_string(),
        "invalid request: missing 'did'"
    );
    assert_eq!(
        ProfileError::ProfileLookup {
            did: "did:example:1234".to_string()
        }
        .to_string(),
        ProfileError::ProfileNotFound {
            did: "did:example:1234".to_string()
        }
        .to_string(),
    );
    assert_eq!(ProfileError::Authentication.kind(), "AuthenticationError");
    assert_eq!(
        ProfileError::CredentialFormat.to_string(),
        ProfileError::Configuration.to_string()
    );
}
