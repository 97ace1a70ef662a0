use std::fmt;

use crate::model::error::StorageError;

pub const DEFAULT_API_URL: &str = "http://v2.api.upyun.com";

pub const ENV_ACCOUNT: &str = "UPYUN_ACCOUNT";
pub const ENV_PASSWORD: &str = "UPYUN_PASSWORD";
pub const ENV_BUCKET: &str = "UPYUN_BUCKET";
pub const ENV_API_URL: &str = "UPYUN_API_URL";

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    account: String,
    password: String,
    bucket: String,
    api_url: String,
}

impl Config {
    pub fn new(account: &str, password: &str, bucket: &str) -> Self {
        Self {
            account: account.to_string(),
            password: password.to_string(),
            bucket: bucket.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Reads credentials from `UPYUN_ACCOUNT`, `UPYUN_PASSWORD` and
    /// `UPYUN_BUCKET`. `UPYUN_API_URL` is optional.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |key: &str| lookup(key).ok_or_else(|| StorageError::Config(key.to_string()));

        let config = Self::new(
            &required(ENV_ACCOUNT)?,
            &required(ENV_PASSWORD)?,
            &required(ENV_BUCKET)?,
        );

        Ok(match lookup(ENV_API_URL) {
            Some(url) => config.with_api_url(&url),
            None => config,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("account", &self.account)
            .field("password", &"***")
            .field("bucket", &self.bucket)
            .field("api_url", &self.api_url)
            .finish()
    }
}
