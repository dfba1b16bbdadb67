//! Push payload normalization

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::notifications::{InboundEvent, NotificationData};

pub const DEFAULT_TITLE: &str = "Mutabakat Sistemi";
pub const DEFAULT_BODY: &str = "Yeni bir bildiriminiz var";
pub const DEFAULT_ICON: &str = "/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/badge-72x72.png";
pub const DEFAULT_TAG: &str = "mutabakat-notification";

/// Vibration pattern of non-silent notifications, in milliseconds
pub const VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];

/// Action id that opens the application
pub const OPEN_ACTION: &str = "open";

/// Action id that only dismisses the notification
pub const CLOSE_ACTION: &str = "close";

/// A button offered on the notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

/// A fully resolved notification, ready to be shown by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub silent: bool,
    /// Empty when silent
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

impl PresentedNotification {
    /// Normalize a raw push payload
    ///
    /// A JSON object is read field by field with defaults for anything
    /// missing. Any other payload is shown as the body of a default-titled
    /// notification. This never fails.
    pub fn from_payload(payload: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(object)) => Self::from_object(&object),
            _ => Self::from_text(&String::from_utf8_lossy(payload)),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str, default: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let flag = |key: &str| object.get(key).and_then(Value::as_bool).unwrap_or(false);

        let silent = flag("silent");
        let data = object
            .get("data")
            .cloned()
            .map(NotificationData::from_value)
            .unwrap_or_default();

        Self {
            title: text("title", DEFAULT_TITLE),
            body: text("body", DEFAULT_BODY),
            icon: text("icon", DEFAULT_ICON),
            badge: text("badge", DEFAULT_BADGE),
            tag: text("tag", DEFAULT_TAG),
            require_interaction: flag("requireInteraction"),
            silent,
            vibrate: vibration(silent),
            actions: default_actions(),
            data,
        }
    }

    fn from_text(text: &str) -> Self {
        let body = if text.trim().is_empty() {
            DEFAULT_BODY.to_string()
        } else {
            text.to_string()
        };

        Self {
            title: DEFAULT_TITLE.to_string(),
            body,
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            tag: DEFAULT_TAG.to_string(),
            require_interaction: false,
            silent: false,
            vibrate: vibration(false),
            actions: default_actions(),
            data: NotificationData::default(),
        }
    }

    pub fn event(&self) -> InboundEvent {
        InboundEvent::from_data(self.title.clone(), self.body.clone(), &self.data)
    }

    /// In-app route an activation leads to
    pub fn route(&self) -> String {
        self.event().route()
    }
}

fn vibration(silent: bool) -> Vec<u32> {
    if silent {
        Vec::new()
    } else {
        VIBRATION_PATTERN.to_vec()
    }
}

fn default_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction::new(OPEN_ACTION, "Görüntüle"),
        NotificationAction::new(CLOSE_ACTION, "Kapat"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> PresentedNotification {
        PresentedNotification::from_payload(value.to_string().as_bytes())
    }

    #[test]
    fn test_empty_payload_gets_default_body() {
        let notification = PresentedNotification::from_payload(b"");
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, DEFAULT_BODY);
        assert_eq!(notification.vibrate, VIBRATION_PATTERN.to_vec());
    }

    #[test]
    fn test_plain_text_becomes_body() {
        let notification = PresentedNotification::from_payload(b"Sunucu bakimda");
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, "Sunucu bakimda");
        assert_eq!(notification.tag, DEFAULT_TAG);
        assert!(notification.data.is_empty());
    }

    #[test]
    fn test_non_object_json_is_shown_as_text() {
        let notification = PresentedNotification::from_payload(b"[1,2]");
        assert_eq!(notification.body, "[1,2]");
    }

    #[test]
    fn test_invalid_utf8_still_presents() {
        let notification = PresentedNotification::from_payload(&[0xff, 0xfe, b'a']);
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert!(!notification.body.is_empty());
    }

    #[test]
    fn test_structured_fields_override_defaults() {
        let notification = normalize(json!({
            "title": "Mutabakat onaylandı",
            "body": "MUT-7 onaylandı",
            "icon": "/custom.png",
            "tag": "mut-7",
            "requireInteraction": true,
            "data": { "type": "mutabakat_approved", "mutabakat_no": "MUT-7" }
        }));

        assert_eq!(notification.title, "Mutabakat onaylandı");
        assert_eq!(notification.body, "MUT-7 onaylandı");
        assert_eq!(notification.icon, "/custom.png");
        assert_eq!(notification.badge, DEFAULT_BADGE);
        assert_eq!(notification.tag, "mut-7");
        assert!(notification.require_interaction);
        assert_eq!(notification.route(), "/mutabakat?search=MUT-7");
    }

    #[test]
    fn test_missing_fields_resolve_to_defaults() {
        let notification = normalize(json!({ "body": "only a body" }));
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.icon, DEFAULT_ICON);
        assert_eq!(notification.badge, DEFAULT_BADGE);
        assert_eq!(notification.tag, DEFAULT_TAG);
        assert!(!notification.require_interaction);
        assert!(!notification.silent);
        assert_eq!(notification.route(), "/");
    }

    #[test]
    fn test_mistyped_fields_fall_back() {
        let notification = normalize(json!({ "title": 5, "silent": "yes", "data": "x" }));
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert!(!notification.silent);
        assert!(notification.data.is_empty());
    }

    #[test]
    fn test_silent_has_no_vibration() {
        let notification = normalize(json!({ "silent": true }));
        assert!(notification.silent);
        assert!(notification.vibrate.is_empty());
    }

    #[test]
    fn test_always_offers_open_and_close() {
        for notification in [normalize(json!({})), PresentedNotification::from_payload(b"x")] {
            let actions: Vec<_> = notification.actions.iter().map(|a| a.action.as_str()).collect();
            assert_eq!(actions, vec![OPEN_ACTION, CLOSE_ACTION]);
        }
    }

    #[test]
    fn test_serializes_with_platform_field_names() {
        let json = serde_json::to_value(normalize(json!({}))).unwrap();
        assert_eq!(json["requireInteraction"], false);
        assert!(json.get("require_interaction").is_none());
    }
}
