//! Secret provider client for executor key material.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Client for the secret-retrieval service.
///
/// Secrets are stored as JSON objects keyed by field name; a secret is
/// addressed by `(secret_name, field_key)`. In development mode the remote
/// service is bypassed entirely and the field key is resolved from the
/// process environment instead.
pub struct SecretsClient {
    client: reqwest::Client,
    base_url: String,
    dev_mode: bool,
}

impl SecretsClient {
    /// Create a new secrets client.
    pub fn new(base_url: impl Into<String>, dev_mode: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            dev_mode,
        }
    }

    /// Fetch a private key by secret name and field key.
    pub async fn private_key(&self, secret_name: &str, field_key: &str) -> Result<String> {
        if self.dev_mode {
            warn!(field_key, "Development mode: resolving signing key from environment");
            return std::env::var(field_key)
                .with_context(|| format!("env var {} not set", field_key));
        }

        let url = format!("{}/v1/secrets/{}", self.base_url, secret_name);
        debug!(secret_name, "Fetching secret");

        let secret: Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("secret provider request failed")?
            .error_for_status()
            .context("secret provider returned an error status")?
            .json()
            .await
            .context("secret payload is not valid JSON")?;

        secret
            .get(field_key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .with_context(|| format!("secret {} has no field {}", secret_name, field_key))
    }
}
