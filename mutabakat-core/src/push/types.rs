//! Push registration types

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PushError;

/// Length of an uncompressed SEC1 P-256 point (0x04 || x || y)
const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Encryption keys handed out by the platform for a push subscription
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionKeys {
    /// Client public key (P-256 ECDH)
    pub p256dh: Vec<u8>,
    /// Authentication secret
    pub auth: Vec<u8>,
}

impl SubscriptionKeys {
    /// Base64url encoding used on the wire
    pub fn to_wire(&self) -> WireKeys {
        WireKeys {
            p256dh: Base64UrlUnpadded::encode_string(&self.p256dh),
            auth: Base64UrlUnpadded::encode_string(&self.auth),
        }
    }
}

impl std::fmt::Debug for SubscriptionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionKeys")
            .field("p256dh_len", &self.p256dh.len())
            .field("auth_len", &self.auth.len())
            .finish()
    }
}

/// Subscription keys as sent to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Free-text description of the subscribing device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub user_agent: String,
    pub device_info: String,
}

/// A subscription object as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSubscription {
    /// Push service endpoint URL
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// The current device's registered push subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Push service endpoint URL, unique per subscription
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub device: DeviceDescriptor,
    /// Mirrors the registry's flag; the registry is authoritative
    pub enabled: bool,
    /// When this client recorded the subscription
    pub subscribed_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(platform: PlatformSubscription, device: DeviceDescriptor, enabled: bool) -> Self {
        Self {
            endpoint: platform.endpoint,
            keys: platform.keys,
            device,
            enabled,
            subscribed_at: Utc::now(),
        }
    }

    /// The platform-side view of this subscription
    pub fn platform(&self) -> PlatformSubscription {
        PlatformSubscription {
            endpoint: self.endpoint.clone(),
            keys: self.keys.clone(),
        }
    }
}

/// VAPID public key of the application server
///
/// Needed by the platform to bind a new subscription to this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyMaterial {
    encoded: String,
    bytes: Vec<u8>,
}

impl ServerKeyMaterial {
    /// Decode and validate a base64url (or standard base64) encoded key
    pub fn from_base64url(encoded: &str) -> Result<Self, PushError> {
        let normalized: String = encoded
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                c => c,
            })
            .collect();

        let bytes = Base64UrlUnpadded::decode_vec(&normalized)
            .map_err(|e| PushError::InvalidServerKey(format!("not base64url: {}", e)))?;

        if bytes.len() != UNCOMPRESSED_POINT_LEN || bytes[0] != 0x04 {
            return Err(PushError::InvalidServerKey(format!(
                "expected a {}-byte uncompressed point, got {} bytes",
                UNCOMPRESSED_POINT_LEN,
                bytes.len()
            )));
        }

        p256::PublicKey::from_sec1_bytes(&bytes)
            .map_err(|_| PushError::InvalidServerKey("not a point on P-256".to_string()))?;

        Ok(Self {
            encoded: normalized,
            bytes,
        })
    }

    /// Raw key bytes for the platform's subscribe call
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64url form, without padding
    pub fn as_base64url(&self) -> &str {
        &self.encoded
    }
}

/// What the UI can show about push notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Readiness {
    /// The runtime cannot do push notifications at all
    Unsupported,
    /// Not determined yet (no credential or server key so far)
    Pending,
    /// Fully known
    Ready { subscribed: bool },
}

/// Result of an operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation ran to completion
    Completed,
    /// Preconditions are not met yet; nothing was attempted
    NotReady(NotReady),
}

/// Benign reasons an operation was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReady {
    MissingCredential,
    Unsupported,
    MissingServerKey,
}

impl std::fmt::Display for NotReady {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MissingCredential => "no session credential",
            Self::Unsupported => "push notifications are not supported here",
            Self::MissingServerKey => "server key has not been fetched",
        };
        f.write_str(text)
    }
}

/// Snapshot of the registration state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushStatus {
    pub readiness: Readiness,
    /// `None` until the capability check ran
    pub capable: Option<bool>,
    pub registry_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    fn generated_key() -> String {
        let secret = p256::SecretKey::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false);
        Base64UrlUnpadded::encode_string(point.as_bytes())
    }

    #[test]
    fn test_server_key_accepts_generated_point() {
        let encoded = generated_key();
        let key = ServerKeyMaterial::from_base64url(&encoded).unwrap();
        assert_eq!(key.as_bytes().len(), 65);
        assert_eq!(key.as_bytes()[0], 0x04);
        assert_eq!(key.as_base64url(), encoded);
    }

    #[test]
    fn test_server_key_accepts_standard_alphabet_with_padding() {
        let encoded = generated_key();
        let standard = encoded.replace('-', "+").replace('_', "/") + "=";
        let key = ServerKeyMaterial::from_base64url(&standard).unwrap();
        assert_eq!(key.as_base64url(), encoded);
    }

    #[test]
    fn test_server_key_rejects_garbage() {
        assert!(matches!(
            ServerKeyMaterial::from_base64url("not*base64"),
            Err(PushError::InvalidServerKey(_))
        ));
        let short = Base64UrlUnpadded::encode_string(&[4u8; 10]);
        assert!(ServerKeyMaterial::from_base64url(&short).is_err());
    }

    #[test]
    fn test_server_key_rejects_point_off_curve() {
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(&[0xFF; 64]);
        let encoded = Base64UrlUnpadded::encode_string(&bytes);
        assert!(ServerKeyMaterial::from_base64url(&encoded).is_err());
    }

    #[test]
    fn test_keys_wire_encoding() {
        let keys = SubscriptionKeys {
            p256dh: vec![0xFB, 0xFF],
            auth: vec![1, 2, 3],
        };
        let wire = keys.to_wire();
        assert_eq!(wire.p256dh, "-_8");
        assert_eq!(wire.auth, "AQID");
    }

    #[test]
    fn test_readiness_serialization() {
        let json = serde_json::to_string(&Readiness::Ready { subscribed: true }).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("\"subscribed\":true"));
    }
}
