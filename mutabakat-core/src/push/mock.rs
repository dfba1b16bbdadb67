//! In-memory platform and registry for tests
//!
//! `MockPlatform` behaves like a browser that grants everything by default;
//! `MockRegistry` keeps records in memory. Both expose knobs to make a single
//! step fail and counters to assert on.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;

use super::platform::{Capabilities, Permission, PushPlatform};
use super::registry::{Registry, RegistryStatus, SubscribeRequest};
use super::types::{DeviceDescriptor, PlatformSubscription, ServerKeyMaterial, SubscriptionKeys};
use crate::credential::Credential;
use crate::error::{PlatformError, RegistryError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Generate a fresh base64url VAPID public key
pub fn generate_server_key() -> String {
    let secret = p256::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    Base64UrlUnpadded::encode_string(point.as_bytes())
}

#[derive(Debug)]
struct PlatformState {
    capabilities: Capabilities,
    capability_queries: usize,
    permission: Permission,
    permission_requests: usize,
    fail_worker: bool,
    worker_registrations: usize,
    fail_create: bool,
    active: Option<PlatformSubscription>,
    created: usize,
}

/// Scriptable push platform
#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<PlatformState>,
}

impl MockPlatform {
    /// Fully capable platform that grants permission
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlatformState {
                capabilities: Capabilities::all(),
                capability_queries: 0,
                permission: Permission::Granted,
                permission_requests: 0,
                fail_worker: false,
                worker_registrations: 0,
                fail_create: false,
                active: None,
                created: 0,
            }),
        }
    }

    pub fn set_capabilities(&self, capabilities: Capabilities) {
        lock(&self.state).capabilities = capabilities;
    }

    pub fn set_permission(&self, permission: Permission) {
        lock(&self.state).permission = permission;
    }

    pub fn fail_worker_registration(&self, fail: bool) {
        lock(&self.state).fail_worker = fail;
    }

    pub fn fail_subscription_create(&self, fail: bool) {
        lock(&self.state).fail_create = fail;
    }

    /// Pretend a subscription survived from an earlier session
    pub fn install_subscription(&self, endpoint: &str) {
        lock(&self.state).active = Some(mock_subscription(endpoint));
    }

    pub fn active_subscription(&self) -> Option<PlatformSubscription> {
        lock(&self.state).active.clone()
    }

    pub fn capability_queries(&self) -> usize {
        lock(&self.state).capability_queries
    }

    pub fn permission_requests(&self) -> usize {
        lock(&self.state).permission_requests
    }

    pub fn worker_registrations(&self) -> usize {
        lock(&self.state).worker_registrations
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_subscription(endpoint: &str) -> PlatformSubscription {
    PlatformSubscription {
        endpoint: endpoint.to_string(),
        keys: SubscriptionKeys {
            p256dh: vec![0x04; 65],
            auth: vec![0xA5; 16],
        },
    }
}

#[async_trait]
impl PushPlatform for MockPlatform {
    fn capabilities(&self) -> Capabilities {
        let mut state = lock(&self.state);
        state.capability_queries += 1;
        state.capabilities
    }

    fn device(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            user_agent: "MockPlatform/1.0".to_string(),
            device_info: "mock".to_string(),
        }
    }

    async fn request_permission(&self) -> Permission {
        let mut state = lock(&self.state);
        state.permission_requests += 1;
        state.permission
    }

    async fn register_worker(&self) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if state.fail_worker {
            return Err(PlatformError::Failed("worker script failed to install".into()));
        }
        state.worker_registrations += 1;
        Ok(())
    }

    async fn existing_subscription(&self) -> Result<Option<PlatformSubscription>, PlatformError> {
        Ok(lock(&self.state).active.clone())
    }

    async fn create_subscription(
        &self,
        _server_key: &ServerKeyMaterial,
    ) -> Result<PlatformSubscription, PlatformError> {
        let mut state = lock(&self.state);
        if state.fail_create {
            return Err(PlatformError::Failed("push service unreachable".into()));
        }
        if let Some(active) = &state.active {
            return Ok(active.clone());
        }
        state.created += 1;
        let subscription =
            mock_subscription(&format!("https://push.example.com/mock/{}", state.created));
        state.active = Some(subscription.clone());
        Ok(subscription)
    }

    async fn invalidate_subscription(
        &self,
        subscription: &PlatformSubscription,
    ) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if state
            .active
            .as_ref()
            .is_some_and(|active| active.endpoint == subscription.endpoint)
        {
            state.active = None;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    server_key: String,
    enabled: bool,
    records: HashSet<String>,
    fail_status: bool,
    fail_subscribe: bool,
    fail_unsubscribe: bool,
    fail_test: bool,
    status_calls: usize,
    unsubscribe_calls: usize,
    test_calls: usize,
}

/// In-memory push registry
#[derive(Debug)]
pub struct MockRegistry {
    state: Mutex<RegistryState>,
}

impl MockRegistry {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                server_key: server_key.into(),
                ..RegistryState::default()
            }),
        }
    }

    pub fn set_server_key(&self, server_key: &str) {
        lock(&self.state).server_key = server_key.to_string();
    }

    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    pub fn fail_status(&self, fail: bool) {
        lock(&self.state).fail_status = fail;
    }

    pub fn fail_subscribe(&self, fail: bool) {
        lock(&self.state).fail_subscribe = fail;
    }

    pub fn fail_unsubscribe(&self, fail: bool) {
        lock(&self.state).fail_unsubscribe = fail;
    }

    pub fn fail_test(&self, fail: bool) {
        lock(&self.state).fail_test = fail;
    }

    pub fn has_record(&self, endpoint: &str) -> bool {
        lock(&self.state).records.contains(endpoint)
    }

    pub fn status_calls(&self) -> usize {
        lock(&self.state).status_calls
    }

    pub fn unsubscribe_calls(&self) -> usize {
        lock(&self.state).unsubscribe_calls
    }

    pub fn test_calls(&self) -> usize {
        lock(&self.state).test_calls
    }
}

fn unavailable() -> RegistryError {
    RegistryError::Status {
        status: 503,
        message: "registry unavailable".to_string(),
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn status(&self, _credential: &Credential) -> Result<RegistryStatus, RegistryError> {
        let mut state = lock(&self.state);
        state.status_calls += 1;
        if state.fail_status {
            return Err(unavailable());
        }
        Ok(RegistryStatus {
            vapid_public_key: state.server_key.clone(),
            enabled: state.enabled,
        })
    }

    async fn subscribe(
        &self,
        _credential: &Credential,
        request: &SubscribeRequest,
    ) -> Result<(), RegistryError> {
        let mut state = lock(&self.state);
        if state.fail_subscribe {
            return Err(unavailable());
        }
        state.records.insert(request.endpoint.clone());
        state.enabled = true;
        Ok(())
    }

    async fn unsubscribe(
        &self,
        _credential: &Credential,
        endpoint: &str,
    ) -> Result<(), RegistryError> {
        let mut state = lock(&self.state);
        state.unsubscribe_calls += 1;
        if state.fail_unsubscribe {
            return Err(unavailable());
        }
        state.records.remove(endpoint);
        state.enabled = !state.records.is_empty();
        Ok(())
    }

    async fn send_test(&self, _credential: &Credential) -> Result<(), RegistryError> {
        let mut state = lock(&self.state);
        state.test_calls += 1;
        if state.fail_test {
            return Err(unavailable());
        }
        Ok(())
    }
}
