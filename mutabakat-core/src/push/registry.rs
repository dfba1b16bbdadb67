//! Remote push registry client
//!
//! The registry stores one record per (credential, endpoint) and is the source
//! of truth for whether push delivery is enabled for the user.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::types::{Subscription, WireKeys};
use crate::credential::Credential;
use crate::error::RegistryError;

/// Response of `GET /push/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    /// Base64url-encoded VAPID public key
    pub vapid_public_key: String,
    /// Whether push delivery is enabled for this user
    #[serde(default)]
    pub enabled: bool,
}

/// Body of `POST /push/subscribe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: WireKeys,
    pub user_agent: String,
    pub device_info: String,
}

impl From<&Subscription> for SubscribeRequest {
    fn from(subscription: &Subscription) -> Self {
        Self {
            endpoint: subscription.endpoint.clone(),
            keys: subscription.keys.to_wire(),
            user_agent: subscription.device.user_agent.clone(),
            device_info: subscription.device.device_info.clone(),
        }
    }
}

/// Operations on the remote push registry
///
/// Every call is authenticated with the session credential.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetch the server key and the user's enabled flag
    async fn status(&self, credential: &Credential) -> Result<RegistryStatus, RegistryError>;

    /// Record a subscription
    async fn subscribe(
        &self,
        credential: &Credential,
        request: &SubscribeRequest,
    ) -> Result<(), RegistryError>;

    /// Delete the record for an endpoint
    async fn unsubscribe(&self, credential: &Credential, endpoint: &str)
    -> Result<(), RegistryError>;

    /// Ask the server to push a test notification to this user
    async fn send_test(&self, credential: &Credential) -> Result<(), RegistryError>;
}

/// Registry client over HTTP
pub struct HttpRegistry {
    base: Url,
    http_client: reqwest::Client,
}

impl HttpRegistry {
    /// Create a client for the API rooted at `base` (e.g. `https://host/api/`)
    pub fn new(base: Url) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(mut base: Url, http_client: reqwest::Client) -> Self {
        // Url::join replaces the last segment unless the path ends in a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base, http_client }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        Ok(self.base.join(path)?)
    }

    async fn send(
        request: RequestBuilder,
        credential: &Credential,
    ) -> Result<Response, RegistryError> {
        let response = request.bearer_auth(credential.token()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn status(&self, credential: &Credential) -> Result<RegistryStatus, RegistryError> {
        let url = self.endpoint("push/status")?;
        debug!("GET {}", url);
        let response = Self::send(self.http_client.get(url), credential).await?;
        Ok(response.json().await?)
    }

    async fn subscribe(
        &self,
        credential: &Credential,
        request: &SubscribeRequest,
    ) -> Result<(), RegistryError> {
        let url = self.endpoint("push/subscribe")?;
        debug!("POST {}", url);
        Self::send(self.http_client.post(url).json(request), credential).await?;
        Ok(())
    }

    async fn unsubscribe(
        &self,
        credential: &Credential,
        endpoint: &str,
    ) -> Result<(), RegistryError> {
        let mut url = self.endpoint("push/unsubscribe")?;
        url.query_pairs_mut().append_pair("endpoint", endpoint);
        debug!("DELETE {}", url);
        Self::send(self.http_client.delete(url), credential).await?;
        Ok(())
    }

    async fn send_test(&self, credential: &Credential) -> Result<(), RegistryError> {
        let url = self.endpoint("push/test")?;
        debug!("POST {}", url);
        Self::send(self.http_client.post(url), credential).await?;
        Ok(())
    }
}

/// Pull a readable message out of an error body
///
/// The API reports errors as `{"detail": "..."}`; anything else is passed
/// through as text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => body.trim().to_string(),
    }
}
