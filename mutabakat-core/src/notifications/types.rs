//! Normalized notification types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::route::route_for;

/// Tag identifying what happened on the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A reconciliation was approved by the counterparty
    Approved,
    /// A reconciliation was rejected by the counterparty
    Rejected,
    /// A reconciliation was sent to the counterparty
    Sent,
    /// Any other tag the server emits
    Other(String),
    /// No tag at all
    Generic,
}

impl EventKind {
    pub const APPROVED_TAG: &'static str = "mutabakat_approved";
    pub const REJECTED_TAG: &'static str = "mutabakat_rejected";
    pub const SENT_TAG: &'static str = "mutabakat_sent";

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            Self::APPROVED_TAG => Self::Approved,
            Self::REJECTED_TAG => Self::Rejected,
            Self::SENT_TAG => Self::Sent,
            "" => Self::Generic,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Approved => Self::APPROVED_TAG,
            Self::Rejected => Self::REJECTED_TAG,
            Self::Sent => Self::SENT_TAG,
            Self::Other(tag) => tag,
            Self::Generic => "",
        }
    }

    /// Whether this kind routes to a reconciliation record
    pub fn is_reconciliation(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Sent)
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_tag().to_string()
    }
}

/// Opaque data bag attached to a notification
///
/// Recognized keys are `type`, `mutabakat_no` and `link`. Everything else is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationData(pub Map<String, Value>);

impl NotificationData {
    /// Wrap a JSON value; anything but an object yields an empty bag
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.0
            .get("type")
            .and_then(Value::as_str)
            .map(EventKind::from_tag)
            .unwrap_or(EventKind::Generic)
    }

    /// Reconciliation record number; numeric ids are rendered as text
    pub fn reference_id(&self) -> Option<String> {
        match self.0.get("mutabakat_no")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<String> {
        self.0
            .get("link")
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .map(String::from)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A notification normalized from either delivery path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
}

impl InboundEvent {
    /// Build from a title, body and data bag
    pub fn from_data(
        title: impl Into<String>,
        body: impl Into<String>,
        data: &NotificationData,
    ) -> Self {
        Self {
            kind: data.kind(),
            title: title.into(),
            body: body.into(),
            reference_id: data.reference_id(),
            target_link: data.link(),
        }
    }

    /// Normalize a structured live channel message
    ///
    /// Routing fields are read from a nested `data` object when the server
    /// sends one, otherwise from the top level. Returns `None` for non-objects.
    pub fn from_message(message: &Value) -> Option<Self> {
        let object = message.as_object()?;
        let data = match object.get("data") {
            Some(Value::Object(nested)) => {
                let mut merged = nested.clone();
                if let Some(kind) = object.get("type")
                    && !merged.contains_key("type")
                {
                    merged.insert("type".to_string(), kind.clone());
                }
                NotificationData(merged)
            }
            _ => NotificationData(object.clone()),
        };

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(String::from);
        let title = text("title").unwrap_or_default();
        let body = text("body").or_else(|| text("message")).unwrap_or_default();

        Some(Self::from_data(title, body, &data))
    }

    /// In-app route this event leads to
    pub fn route(&self) -> String {
        route_for(
            &self.kind,
            self.reference_id.as_deref(),
            self.target_link.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_tags() {
        assert_eq!(EventKind::from_tag("mutabakat_approved"), EventKind::Approved);
        assert_eq!(EventKind::from_tag("mutabakat_rejected"), EventKind::Rejected);
        assert_eq!(EventKind::from_tag("mutabakat_sent"), EventKind::Sent);
        assert_eq!(EventKind::from_tag(""), EventKind::Generic);
        assert_eq!(
            EventKind::from_tag("system_notice"),
            EventKind::Other("system_notice".to_string())
        );
        assert!(EventKind::Sent.is_reconciliation());
        assert!(!EventKind::Other("x".into()).is_reconciliation());
    }

    #[test]
    fn test_event_kind_serializes_as_tag() {
        let json = serde_json::to_string(&EventKind::Approved).unwrap();
        assert_eq!(json, "\"mutabakat_approved\"");
        let kind: EventKind = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(kind, EventKind::Other("custom".into()));
    }

    #[test]
    fn test_data_reference_id_accepts_numbers() {
        let data = NotificationData::from_value(json!({ "mutabakat_no": 4711 }));
        assert_eq!(data.reference_id().as_deref(), Some("4711"));

        let data = NotificationData::from_value(json!({ "mutabakat_no": "MUT-9" }));
        assert_eq!(data.reference_id().as_deref(), Some("MUT-9"));

        let data = NotificationData::from_value(json!({ "mutabakat_no": "" }));
        assert!(data.reference_id().is_none());
    }

    #[test]
    fn test_data_from_non_object_is_empty() {
        assert!(NotificationData::from_value(json!("text")).is_empty());
        assert!(NotificationData::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_from_message_with_nested_data() {
        let message = json!({
            "type": "mutabakat_approved",
            "title": "Onaylandı",
            "message": "Mutabakat onaylandı",
            "data": { "mutabakat_no": "MUT-1" }
        });
        let event = InboundEvent::from_message(&message).unwrap();
        assert_eq!(event.kind, EventKind::Approved);
        assert_eq!(event.body, "Mutabakat onaylandı");
        assert_eq!(event.reference_id.as_deref(), Some("MUT-1"));
        assert_eq!(event.route(), "/mutabakat?search=MUT-1");
    }

    #[test]
    fn test_from_message_flat() {
        let message = json!({ "type": "notice", "body": "hi", "link": "/reports" });
        let event = InboundEvent::from_message(&message).unwrap();
        assert_eq!(event.kind, EventKind::Other("notice".into()));
        assert_eq!(event.route(), "/reports");
    }

    #[test]
    fn test_from_message_rejects_non_objects() {
        assert!(InboundEvent::from_message(&json!([1])).is_none());
        assert!(InboundEvent::from_message(&json!("pong")).is_none());
    }
}
