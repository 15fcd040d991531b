//! Minimal blocking XRPC client for AT protocol profile lookups, plus the handful of
//! `com.atproto` and `app.bsky` wire types it needs.

pub mod app_bsky;
pub mod com_atproto;
pub mod identifiers;
pub mod xrpc;

pub use app_bsky::{Label, MuteListEntry, ProfileRecord, StrongRef, Viewer};
pub use com_atproto::Session;
pub use identifiers::Nsid;
pub use xrpc::{build_http_client, XrpcClient, XrpcError};
