//! Push registration manager
//!
//! Keeps the platform's push subscription and the registry record in step.
//! Mutating operations take `&mut self`, so one instance never runs two of
//! them concurrently.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::platform::{Permission, PushPlatform};
use super::registry::{Registry, SubscribeRequest};
use super::types::{
    NotReady, Outcome, PushStatus, Readiness, ServerKeyMaterial, Subscription,
};
use crate::credential::CredentialSource;
use crate::error::PushError;

/// Manages opt-in and opt-out of push notifications for one session
pub struct PushRegistrationManager {
    platform: Arc<dyn PushPlatform>,
    registry: Arc<dyn Registry>,
    credentials: Arc<dyn CredentialSource>,
    capable: Option<bool>,
    server_key: Option<ServerKeyMaterial>,
    registry_enabled: bool,
    subscription: Option<Subscription>,
}

impl PushRegistrationManager {
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        registry: Arc<dyn Registry>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            platform,
            registry,
            credentials,
            capable: None,
            server_key: None,
            registry_enabled: false,
            subscription: None,
        }
    }

    /// Detect platform support; evaluated once per manager
    pub fn check_capability(&mut self) -> bool {
        if let Some(capable) = self.capable {
            return capable;
        }

        let capabilities = self.platform.capabilities();
        let capable = capabilities.is_complete();
        if !capable {
            info!("Push notifications unsupported: {:?}", capabilities);
        }
        self.capable = Some(capable);
        capable
    }

    /// Fetch the server key and the registry's enabled flag
    ///
    /// A registry failure is logged and leaves the cached state untouched; it
    /// is reported as [`NotReady::MissingServerKey`] when no key was cached
    /// before.
    pub async fn fetch_server_key_material(&mut self) -> Outcome {
        let Some(credential) = self.credentials.credential() else {
            debug!("No credential, skipping push status fetch");
            return Outcome::NotReady(NotReady::MissingCredential);
        };

        let fetched = match self.registry.status(&credential).await {
            Ok(status) => ServerKeyMaterial::from_base64url(&status.vapid_public_key)
                .map(|key| (key, status.enabled)),
            Err(e) => Err(e.into()),
        };

        match fetched {
            Ok((key, enabled)) => {
                debug!("Fetched server key, registry enabled = {}", enabled);
                self.server_key = Some(key);
                self.registry_enabled = enabled;
                if let Some(subscription) = self.subscription.as_mut() {
                    subscription.enabled = enabled;
                }
                Outcome::Completed
            }
            Err(e) => {
                warn!("Failed to fetch push status: {}", e);
                if self.server_key.is_some() {
                    Outcome::Completed
                } else {
                    Outcome::NotReady(NotReady::MissingServerKey)
                }
            }
        }
    }

    /// Adopt a subscription the platform already holds
    ///
    /// The registry must agree before the subscription counts as subscribed.
    pub async fn reconcile_existing_subscription(&mut self) -> Result<Outcome, PushError> {
        if !self.check_capability() {
            return Ok(Outcome::NotReady(NotReady::Unsupported));
        }

        let existing = match self.platform.existing_subscription().await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Failed to read existing push subscription: {}", e);
                return Err(PushError::SubscriptionLookup(e));
            }
        };

        let Some(existing) = existing else {
            debug!("No existing push subscription");
            self.subscription = None;
            return Ok(Outcome::Completed);
        };

        if let Some(credential) = self.credentials.credential() {
            match self.registry.status(&credential).await {
                Ok(status) => self.registry_enabled = status.enabled,
                Err(e) => warn!("Could not confirm subscription with registry: {}", e),
            }
        }

        debug!(
            "Found existing push subscription {}, registry enabled = {}",
            existing.endpoint, self.registry_enabled
        );
        self.subscription = Some(Subscription::new(
            existing,
            self.platform.device(),
            self.registry_enabled,
        ));
        Ok(Outcome::Completed)
    }

    /// Opt in to push notifications
    ///
    /// Fails fast at the first failing step. On failure nothing is recorded
    /// and a subscription created during this call is rolled back; one the
    /// platform already held is left in place.
    pub async fn subscribe(&mut self) -> Result<Outcome, PushError> {
        if !self.check_capability() {
            return Ok(Outcome::NotReady(NotReady::Unsupported));
        }
        let Some(server_key) = self.server_key.clone() else {
            return Ok(Outcome::NotReady(NotReady::MissingServerKey));
        };
        let Some(credential) = self.credentials.credential() else {
            return Ok(Outcome::NotReady(NotReady::MissingCredential));
        };

        match self.platform.request_permission().await {
            Permission::Granted => {}
            Permission::Denied => return Err(PushError::PermissionDenied),
            Permission::Dismissed => return Err(PushError::PermissionDismissed),
        }

        self.platform
            .register_worker()
            .await
            .map_err(PushError::WorkerRegistration)?;

        // The platform hands back a subscription it already holds
        let prior = self
            .platform
            .existing_subscription()
            .await
            .map_err(PushError::SubscriptionLookup)?
            .map(|existing| existing.endpoint);

        let created = self
            .platform
            .create_subscription(&server_key)
            .await
            .map_err(PushError::SubscriptionCreate)?;

        let subscription = Subscription::new(created, self.platform.device(), true);
        let request = SubscribeRequest::from(&subscription);

        if let Err(e) = self.registry.subscribe(&credential, &request).await {
            if prior.as_deref() == Some(subscription.endpoint.as_str()) {
                debug!("Keeping pre-existing push subscription {}", subscription.endpoint);
            } else {
                self.roll_back(&subscription).await;
            }
            return Err(e.into());
        }

        info!("Subscribed to push notifications at {}", subscription.endpoint);
        self.registry_enabled = true;
        self.subscription = Some(subscription);
        Ok(Outcome::Completed)
    }

    /// Opt out of push notifications
    ///
    /// The registry delete is best effort; the local subscription is cleared
    /// either way.
    pub async fn unsubscribe(&mut self) -> Result<Outcome, PushError> {
        let Some(subscription) = self.subscription.take() else {
            debug!("No push subscription, nothing to unsubscribe");
            return Ok(Outcome::Completed);
        };

        match self.credentials.credential() {
            Some(credential) => {
                if let Err(e) = self
                    .registry
                    .unsubscribe(&credential, &subscription.endpoint)
                    .await
                {
                    warn!("Registry unsubscribe failed, continuing locally: {}", e);
                }
            }
            None => debug!("No credential, skipping registry unsubscribe"),
        }

        if let Err(e) = self
            .platform
            .invalidate_subscription(&subscription.platform())
            .await
        {
            warn!("Failed to invalidate local push subscription: {}", e);
        }

        info!("Unsubscribed from push notifications");
        self.registry_enabled = false;
        Ok(Outcome::Completed)
    }

    /// Ask the server to send a test notification
    pub async fn send_test_notification(&self) -> Result<Outcome, PushError> {
        let Some(credential) = self.credentials.credential() else {
            return Ok(Outcome::NotReady(NotReady::MissingCredential));
        };
        self.registry.send_test(&credential).await?;
        Ok(Outcome::Completed)
    }

    /// Three-valued readiness for the UI
    pub fn readiness(&self) -> Readiness {
        match self.capable {
            Some(false) => Readiness::Unsupported,
            None => Readiness::Pending,
            Some(true) if self.server_key.is_none() => Readiness::Pending,
            Some(true) => Readiness::Ready {
                subscribed: self.is_subscribed(),
            },
        }
    }

    /// Local subscription exists and the registry has it enabled
    pub fn is_subscribed(&self) -> bool {
        self.registry_enabled && self.subscription.as_ref().is_some_and(|s| s.enabled)
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn server_key(&self) -> Option<&ServerKeyMaterial> {
        self.server_key.as_ref()
    }

    pub fn status(&self) -> PushStatus {
        PushStatus {
            readiness: self.readiness(),
            capable: self.capable,
            registry_enabled: self.registry_enabled,
            endpoint: self.subscription.as_ref().map(|s| s.endpoint.clone()),
        }
    }

    async fn roll_back(&self, subscription: &Subscription) {
        if let Err(e) = self
            .platform
            .invalidate_subscription(&subscription.platform())
            .await
        {
            warn!("Failed to roll back push subscription: {}", e);
        }
    }
}
