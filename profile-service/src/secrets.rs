use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use log::{debug, info};
use tokio::runtime::Handle;

/// Region used when neither the environment nor the AWS profile names one
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret name is required")]
    MissingName,

    #[error("failed to retrieve secret {name}: {reason}")]
    Store { name: String, reason: String },

    #[error("secret {0} has no string value")]
    NoValue(String),
}

/// Fetches raw secret payloads by name
pub trait SecretResolver {
    fn resolve(&self, name: &str) -> Result<String, SecretError>;
}

/// AWS Secrets Manager, current version stage.
///
/// The SDK is async while the orchestrator blocks, so calls are driven on the captured runtime
/// handle. `resolve()` must run on a blocking-capable thread (eg, inside `spawn_blocking`), never
/// directly on an async task.
#[derive(Debug, Clone)]
pub struct AwsSecretResolver {
    client: aws_sdk_secretsmanager::Client,
    runtime: Handle,
}

impl AwsSecretResolver {
    pub fn new(client: aws_sdk_secretsmanager::Client, runtime: Handle) -> Self {
        AwsSecretResolver { client, runtime }
    }

    /// Loads AWS config from the usual provider chain; must be called from within a tokio runtime
    pub async fn from_env() -> Self {
        let region = RegionProviderChain::default_provider().or_else(Region::new(DEFAULT_REGION));
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        info!(
            "AWS Secrets Manager client configured region={:?}",
            config.region()
        );
        Self::new(
            aws_sdk_secretsmanager::Client::new(&config),
            Handle::current(),
        )
    }

    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let resp = self
            .client
            .get_secret_value()
            .secret_id(name)
            .version_stage("AWSCURRENT")
            .send()
            .await
            .map_err(|e| SecretError::Store {
                name: name.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        resp.secret_string()
            .map(|s| s.to_string())
            .ok_or_else(|| SecretError::NoValue(name.to_string()))
    }
}

impl SecretResolver for AwsSecretResolver {
    fn resolve(&self, name: &str) -> Result<String, SecretError> {
        if name.is_empty() {
            return Err(SecretError::MissingName);
        }
        debug!("fetching secret from Secrets Manager name={}", name);
        self.runtime.block_on(self.fetch(name))
    }
}

/// Treats the secret name as an environment variable holding the payload. For local runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretResolver;

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, name: &str) -> Result<String, SecretError> {
        if name.is_empty() {
            return Err(SecretError::MissingName);
        }
        match std::env::var(name) {
            Ok(val) if !val.is_empty() => Ok(val),
            Ok(_) => Err(SecretError::NoValue(name.to_string())),
            Err(e) => Err(SecretError::Store {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[test]
fn test_env_resolver() {
    let resolver = EnvSecretResolver;
    assert!(matches!(resolver.resolve(""), Err(SecretError::MissingName)));

    std::env::set_var("PROFILE_SERVICE_TEST_SECRET", r#"{"username": "u"}"#);
    assert_eq!(
        resolver.resolve("PROFILE_SERVICE_TEST_SECRET").unwrap(),
        r#"{"username": "u"}"#
    );
    std::env::remove_var("PROFILE_SERVICE_TEST_SECRET");

    assert!(matches!(
        resolver.resolve("PROFILE_SERVICE_TEST_SECRET_UNSET"),
        Err(SecretError::Store { .. })
    ));
}
