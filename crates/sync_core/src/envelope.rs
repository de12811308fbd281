//! Frame decoding: raw text frames into typed envelopes.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entity::{
    AnalyticsSnapshot, Connector, ConnectorPatch, DashboardStats, Document, DocumentPatch,
    EntityFamily, EntityId, WorkerHealth,
};

/// Name of the discriminant field on every inbound frame.
pub const TAG_FIELD: &str = "type";

/// Every notification kind this client knows how to route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    ConnectorCreated {
        connector: Connector,
    },
    ConnectorUpdated {
        connector: Connector,
    },
    ConnectorStatus {
        id: EntityId,
        status: Option<String>,
        document_count: Option<u64>,
        #[serde(default, deserialize_with = "present")]
        last_sync_at: Option<Option<String>>,
        #[serde(default, deserialize_with = "present")]
        error_message: Option<Option<String>>,
    },
    ConnectorDeleted {
        id: EntityId,
    },
    DocumentCreated {
        document: Document,
    },
    DocumentUpdated {
        document: Document,
    },
    DocumentStatus {
        id: EntityId,
        status: Option<String>,
        token_count: Option<u64>,
        vector_count: Option<u64>,
        #[serde(default, deserialize_with = "present")]
        updated_at: Option<Option<String>>,
        #[serde(default, deserialize_with = "present")]
        error_message: Option<Option<String>>,
    },
    DocumentProgress {
        id: EntityId,
        processed: u64,
        total: u64,
    },
    DocumentDeleted {
        id: EntityId,
    },
    WorkerHeartbeat {
        health: WorkerHealth,
    },
    DashboardStats {
        stats: DashboardStats,
    },
    AnalyticsSnapshot {
        snapshot: AnalyticsSnapshot,
    },
    /// A well-formed frame whose tag this client does not know.
    #[serde(other)]
    Unrecognized,
}

impl Message {
    pub fn family(&self) -> Option<EntityFamily> {
        match self {
            Message::ConnectorCreated { .. }
            | Message::ConnectorUpdated { .. }
            | Message::ConnectorStatus { .. }
            | Message::ConnectorDeleted { .. } => Some(EntityFamily::Connectors),
            Message::DocumentCreated { .. }
            | Message::DocumentUpdated { .. }
            | Message::DocumentStatus { .. }
            | Message::DocumentProgress { .. }
            | Message::DocumentDeleted { .. } => Some(EntityFamily::Documents),
            Message::WorkerHeartbeat { .. } => Some(EntityFamily::Workers),
            Message::DashboardStats { .. } => Some(EntityFamily::Dashboard),
            Message::AnalyticsSnapshot { .. } => Some(EntityFamily::Analytics),
            Message::Unrecognized => None,
        }
    }
}

/// A field that is in the frame, even as `null`, becomes `Some`. Absent fields
/// fall back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn connector_patch(
    status: Option<String>,
    document_count: Option<u64>,
    last_sync_at: Option<Option<String>>,
    error_message: Option<Option<String>>,
) -> ConnectorPatch {
    ConnectorPatch {
        status,
        document_count,
        last_sync_at,
        error_message,
    }
}

pub(crate) fn document_status_patch(
    status: Option<String>,
    token_count: Option<u64>,
    vector_count: Option<u64>,
    updated_at: Option<Option<String>>,
    error_message: Option<Option<String>>,
) -> DocumentPatch {
    DocumentPatch {
        status,
        token_count,
        vector_count,
        updated_at,
        error_message,
        ..DocumentPatch::default()
    }
}

/// A decoded frame: the raw tag as sent plus the typed message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub tag: String,
    pub message: Message,
}

impl Envelope {
    pub fn is_recognized(&self) -> bool {
        self.message != Message::Unrecognized
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Syntax(String),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("frame has no string `type` tag")]
    MissingTag,
    #[error("`{tag}` frame is malformed: {reason}")]
    Malformed { tag: String, reason: String },
}

/// Decodes one text frame. Callers drop the frame on error; the connection stays up.
pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| DecodeError::Syntax(err.to_string()))?;
    let tag = match &value {
        Value::Object(fields) => match fields.get(TAG_FIELD) {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err(DecodeError::MissingTag),
        },
        _ => return Err(DecodeError::NotAnObject),
    };

    let message = Message::deserialize(value).map_err(|err| DecodeError::Malformed {
        tag: tag.clone(),
        reason: err.to_string(),
    })?;
    Ok(Envelope { tag, message })
}
