use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::core::{EfattureError, Signer};

/// Largest signed file the service accepts for upload (4.5 MiB).
pub const DEFAULT_MAX_SIGNED_SIZE: usize = 4_718_592;

const ENV_CLIENT_ID: &str = "EFATTURE_CLIENT_ID";
const ENV_SECRET: &str = "EFATTURE_SECRET";

/// API identity: the `apiUuid` and the shared secret used for digests.
///
/// Deserializes from `{"clientId": ..., "secret": ...}` (`client_id`,
/// `apiUuid` and `privateKey` are accepted as aliases).
#[derive(Clone, Deserialize)]
#[serde(from = "RawCredentials")]
pub struct Credentials {
    client_id: String,
    secret: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCredentials {
    #[serde(alias = "client_id", alias = "apiUuid")]
    client_id: String,
    #[serde(alias = "privateKey")]
    secret: String,
}

impl From<RawCredentials> for Credentials {
    fn from(raw: RawCredentials) -> Self {
        Self::new(raw.client_id, raw.secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Read `EFATTURE_CLIENT_ID` and `EFATTURE_SECRET`.
    pub fn from_env() -> Result<Self, EfattureError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| EfattureError::InvalidArgument(format!("{name} is not set")))
        };
        Ok(Self::new(var(ENV_CLIENT_ID)?.trim(), var(ENV_SECRET)?))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn signer(&self) -> Signer {
        Signer::new(
            self.client_id.clone(),
            SecretString::from(self.secret.expose_secret().to_owned()),
        )
    }
}

/// Runtime configuration of a [`Client`](super::Client).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Upload limit for signed files, in bytes.
    #[serde(default = "default_max_signed_size")]
    pub max_signed_size: usize,
}

fn default_max_signed_size() -> usize {
    DEFAULT_MAX_SIGNED_SIZE
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            max_signed_size: DEFAULT_MAX_SIGNED_SIZE,
        }
    }

    pub fn from_env() -> Result<Self, EfattureError> {
        Ok(Self::new(Credentials::from_env()?))
    }

    pub fn max_signed_size(mut self, bytes: usize) -> Self {
        self.max_signed_size = bytes;
        self
    }
}
