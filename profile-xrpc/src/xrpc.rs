use crate::app_bsky::ProfileRecord;
use crate::com_atproto::{Session, SessionRequest};
use crate::identifiers::Nsid;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use reqwest::header;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

lazy_static! {
    static ref CREATE_SESSION: Nsid = Nsid::from_str("com.atproto.server.createSession").unwrap();
    static ref GET_PROFILE: Nsid = Nsid::from_str("app.bsky.actor.getProfile").unwrap();
}

/// Failure of a single XRPC round trip.
///
/// `Status` is anything other than HTTP 200; the error body is only parsed on a best-effort
/// basis, since proxies and load balancers in front of a PDS don't speak XRPC.
#[derive(Debug, thiserror::Error)]
pub enum XrpcError {
    #[error("XRPC request failed to complete: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("XRPC {nsid} failed ({status}): {}", .message.as_deref().unwrap_or("unknown"))]
    Status {
        nsid: String,
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error("could not parse XRPC response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("auth token can not be used as an HTTP header value")]
    InvalidToken,
}

impl XrpcError {
    /// HTTP status of the failed response, if one arrived at all
    pub fn status(&self) -> Option<u16> {
        match self {
            XrpcError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rejected credentials or token, as opposed to a network or server problem
    pub fn is_auth_failure(&self) -> bool {
        match self {
            XrpcError::Status { status, error, .. } => {
                *status == 401
                    || *status == 403
                    || error.as_deref() == Some("AuthenticationRequired")
            }
            XrpcError::InvalidToken => true,
            _ => false,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Builds the HTTP client shared by every `XrpcClient`. No timeout override: the reqwest default
/// applies.
pub fn build_http_client() -> Result<reqwest::blocking::Client, XrpcError> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()?)
}

#[derive(Debug, Clone)]
pub struct XrpcClient {
    http_client: reqwest::blocking::Client,
    host: String,
}

impl XrpcClient {
    pub fn new(host: &str) -> Result<Self, XrpcError> {
        Ok(Self::with_http_client(host, build_http_client()?))
    }

    /// Wraps an existing HTTP client; `reqwest` clients are cheap to clone and share a pool.
    pub fn with_http_client(host: &str, http_client: reqwest::blocking::Client) -> Self {
        XrpcClient {
            http_client,
            host: host.trim_end_matches('/').to_string(),
        }
    }

    fn auth_headers(&self, auth_token: Option<&str>) -> Result<header::HeaderMap, XrpcError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = auth_token {
            let mut auth_value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| XrpcError::InvalidToken)?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        };
        Ok(headers)
    }

    fn parse_response<T: DeserializeOwned>(
        nsid: &Nsid,
        res: reqwest::blocking::Response,
    ) -> Result<T, XrpcError> {
        let status = res.status();
        let body = res.bytes()?;
        if status != StatusCode::OK {
            let info: Option<XrpcErrorBody> = serde_json::from_slice(&body).ok();
            let (error, message) = match info {
                Some(b) => (b.error, b.message),
                None => (None, None),
            };
            warn!(
                "XRPC {} returned status={} error={:?} message={:?}",
                nsid,
                status.as_u16(),
                error,
                message
            );
            return Err(XrpcError::Status {
                nsid: nsid.to_string(),
                status: status.as_u16(),
                error,
                message,
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        nsid: &Nsid,
        params: Option<HashMap<String, String>>,
        auth_token: Option<&str>,
    ) -> Result<T, XrpcError> {
        debug!("XRPC GET endpoint={} params={:?}", nsid, params);
        let params: HashMap<String, String> = params.unwrap_or_default();
        let res = self
            .http_client
            .get(format!("{}/xrpc/{nsid}", self.host))
            .headers(self.auth_headers(auth_token)?)
            .query(&params)
            .send()?;
        Self::parse_response(nsid, res)
    }

    /// JSON body POST. The body is not logged, it may hold a password.
    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        nsid: &Nsid,
        body: &B,
        auth_token: Option<&str>,
    ) -> Result<T, XrpcError> {
        debug!("XRPC POST endpoint={}", nsid);
        let res = self
            .http_client
            .post(format!("{}/xrpc/{nsid}", self.host))
            .headers(self.auth_headers(auth_token)?)
            .json(body)
            .send()?;
        Self::parse_response(nsid, res)
    }

    /// Authenticates with `com.atproto.server.createSession`
    pub fn create_session(&self, identifier: &str, password: &str) -> Result<Session, XrpcError> {
        info!("creating session identifier={}", identifier);
        let req = SessionRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let session: Session = self.post(&CREATE_SESSION, &req, None)?;
        debug!("session created did={} handle={}", session.did, session.handle);
        Ok(session)
    }

    /// Fetches `app.bsky.actor.getProfile` for `actor` (a DID or handle) as the session holder
    pub fn get_profile(&self, actor: &str, access_jwt: &str) -> Result<ProfileRecord, XrpcError> {
        info!("fetching profile actor={}", actor);
        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("actor".to_string(), actor.to_string());
        self.get(&GET_PROFILE, Some(params), Some(access_jwt))
    }
}

#[test]
fn test_error_classification() {
    let unauthorized = XrpcError::Status {
        nsid: "com.atproto.server.createSession".to_string(),
        status: 401,
        error: Some("AuthenticationRequired".to_string()),
        message: Some("Invalid identifier or password".to_string()),
    };
    assert_eq!(unauthorized.status(), Some(401));
    assert!(unauthorized.is_auth_failure());

    let unavailable = XrpcError::Status {
        nsid: "com.atproto.server.createSession".to_string(),
        status: 503,
        error: None,
        message: None,
    };
    assert!(!unavailable.is_auth_failure());
    assert_eq!(
        unavailable.to_string(),
        "XRPC com.atproto.server.createSession failed (503): unknown"
    );

    let decode = XrpcError::from(serde_json::from_str::<Session>("<html>").unwrap_err());
    assert_eq!(decode.status(), None);
    assert!(!decode.is_auth_failure());
}
