/// Environment variable with the identity service (PDS or AppView) base URL
pub const BASE_URL_ENV: &str = "ATPROTO_BASE_URL";

/// Environment variable naming the secret which holds the util account credentials
pub const UTIL_ACCOUNT_SECRET_ENV: &str = "PDS_UTIL_ACCOUNT_CREDS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub atproto_base_url: String,
    /// May be empty; the secret store rejects that when it is used
    pub util_account_secret_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
}

impl Config {
    /// Builds config from any variable lookup, eg `|k| std::env::var(k).ok()`
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let atproto_base_url = lookup(BASE_URL_ENV)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_ENV))?;
        let util_account_secret_name = lookup(UTIL_ACCOUNT_SECRET_ENV)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        Ok(Config {
            atproto_base_url,
            util_account_secret_name,
        })
    }
}

/// Where the orchestrator gets its config from, on every invocation
pub trait ConfigSource {
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Reads config from the process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::from_vars(|k| std::env::var(k).ok())
    }
}

/// Fixed config, eg from command line arguments
impl ConfigSource for Config {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.clone())
    }
}

#[test]
fn test_from_vars() {
    let config = Config::from_vars(|k| match k {
        BASE_URL_ENV => Some("https://pds.example.com/".to_string()),
        UTIL_ACCOUNT_SECRET_ENV => Some("prod/pds/util-account".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.atproto_base_url, "https://pds.example.com");
    assert_eq!(config.util_account_secret_name, "prod/pds/util-account");

    let config = Config::from_vars(|k| match k {
        BASE_URL_ENV => Some("https://pds.example.com".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.util_account_secret_name, "");
}

#[test]
fn test_from_vars_missing_base_url() {
    let err = Config::from_vars(|_| None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "ATPROTO_BASE_URL environment variable is required"
    );
    assert!(Config::from_vars(|k| match k {
        BASE_URL_ENV => Some("  ".to_string()),
        _ => None,
    })
    .is_err());
}

#[test]
fn test_env_config() {
    // only test in the crate touching these two variables
    std::env::set_var(BASE_URL_ENV, "https://pds.example.com/");
    std::env::set_var(UTIL_ACCOUNT_SECRET_ENV, "test/util-account");
    let config = EnvConfig.load().unwrap();
    assert_eq!(config.atproto_base_url, "https://pds.example.com");
    assert_eq!(config.util_account_secret_name, "test/util-account");

    std::env::remove_var(BASE_URL_ENV);
    assert!(matches!(
        EnvConfig.load(),
        Err(ConfigError::Missing(BASE_URL_ENV))
    ));
    std::env::remove_var(UTIL_ACCOUNT_SECRET_ENV);
}
