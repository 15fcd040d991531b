//! Profile lookups against an AT protocol service, authenticated as a utility account whose
//! credentials live in a secret store.

pub mod config;
pub mod credentials;
pub mod profile;
pub mod request;
pub mod secrets;

pub use config::{Config, ConfigError, ConfigSource, EnvConfig};
pub use credentials::{DecodeError, UtilAccountCredentials};
pub use profile::{Connector, ProfileApi, ProfileError, ProfileService, XrpcConnector};
pub use profile_xrpc::ProfileRecord;
pub use request::ProfileRequest;
pub use secrets::{AwsSecretResolver, EnvSecretResolver, SecretError, SecretResolver};
