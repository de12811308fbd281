use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::{merge_field, merge_nullable, merge_optional, KeyedEntity};

pub type EntityId = String;

/// One independently cached entity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFamily {
    Connectors,
    Documents,
    Dashboard,
    Analytics,
    Workers,
}

impl EntityFamily {
    pub const ALL: [EntityFamily; 5] = [
        EntityFamily::Connectors,
        EntityFamily::Documents,
        EntityFamily::Dashboard,
        EntityFamily::Analytics,
        EntityFamily::Workers,
    ];

    /// Point-in-time rollups that are replaced wholesale instead of keyed by id.
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            EntityFamily::Dashboard | EntityFamily::Analytics | EntityFamily::Workers
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityFamily::Connectors => "connectors",
            EntityFamily::Documents => "documents",
            EntityFamily::Dashboard => "dashboard",
            EntityFamily::Analytics => "analytics",
            EntityFamily::Workers => "workers",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub document_count: u64,
    #[serde(default)]
    pub last_sync_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Fields a `connector_status` notification may carry. Absent fields are left
/// alone; `Some(None)` on a nullable field clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectorPatch {
    pub status: Option<String>,
    pub document_count: Option<u64>,
    pub last_sync_at: Option<Option<String>>,
    pub error_message: Option<Option<String>>,
}

impl KeyedEntity for Connector {
    type Patch = ConnectorPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &ConnectorPatch) -> bool {
        let mut changed = merge_field(&mut self.status, &patch.status);
        changed |= merge_field(&mut self.document_count, &patch.document_count);
        changed |= merge_nullable(&mut self.last_sync_at, &patch.last_sync_at);
        changed |= merge_nullable(&mut self.error_message, &patch.error_message);
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: EntityId,
    #[serde(default)]
    pub connector_id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub token_count: Option<u64>,
    #[serde(default)]
    pub vector_count: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Document {
    /// Completion in whole percent, when the server has reported a total.
    pub fn progress_percent(&self) -> Option<u8> {
        match (self.processed, self.total) {
            (Some(processed), Some(total)) if total > 0 => {
                let percent = processed.min(total).saturating_mul(100) / total;
                Some(percent as u8)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentPatch {
    pub status: Option<String>,
    pub processed: Option<u64>,
    pub total: Option<u64>,
    pub token_count: Option<u64>,
    pub vector_count: Option<u64>,
    pub updated_at: Option<Option<String>>,
    pub error_message: Option<Option<String>>,
}

impl DocumentPatch {
    pub fn progress(processed: u64, total: u64) -> Self {
        Self {
            processed: Some(processed),
            total: Some(total),
            ..Self::default()
        }
    }
}

impl KeyedEntity for Document {
    type Patch = DocumentPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: &DocumentPatch) -> bool {
        let mut changed = merge_field(&mut self.status, &patch.status);
        changed |= merge_optional(&mut self.processed, &patch.processed);
        changed |= merge_optional(&mut self.total, &patch.total);
        changed |= merge_optional(&mut self.token_count, &patch.token_count);
        changed |= merge_optional(&mut self.vector_count, &patch.vector_count);
        changed |= merge_nullable(&mut self.updated_at, &patch.updated_at);
        changed |= merge_nullable(&mut self.error_message, &patch.error_message);
        changed
    }
}

/// Dashboard rollup. Unknown keys are kept in `extra` so newer servers can add counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_connectors: u64,
    #[serde(default)]
    pub active_connectors: u64,
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub processing_documents: u64,
    #[serde(default)]
    pub failed_documents: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub conversations: u64,
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub average_latency_ms: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub name: String,
    pub alive: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerHealth {
    #[serde(default)]
    pub workers: Vec<WorkerStatus>,
    #[serde(default)]
    pub reported_at: Option<String>,
}

impl WorkerHealth {
    pub fn alive_count(&self) -> usize {
        self.workers.iter().filter(|worker| worker.alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        Document {
            id: "doc-1".to_string(),
            connector_id: "c-1".to_string(),
            name: "handbook.pdf".to_string(),
            status: "processing".to_string(),
            processed: Some(3),
            total: Some(12),
            token_count: None,
            vector_count: None,
            updated_at: None,
            error_message: None,
        }
    }

    #[test]
    fn family_parse_is_case_insensitive() {
        assert_eq!(EntityFamily::parse(" Documents "), Some(EntityFamily::Documents));
        assert_eq!(EntityFamily::parse("nope"), None);
        assert!(EntityFamily::Workers.is_aggregate());
        assert!(!EntityFamily::Connectors.is_aggregate());
    }

    #[test]
    fn progress_percent_needs_a_total() {
        let mut doc = document();
        assert_eq!(doc.progress_percent(), Some(25));
        doc.total = Some(0);
        assert_eq!(doc.progress_percent(), None);
        doc.total = None;
        assert_eq!(doc.progress_percent(), None);
    }

    #[test]
    fn patch_reports_whether_anything_changed() {
        let mut doc = document();
        let same = DocumentPatch {
            status: Some("processing".to_string()),
            ..DocumentPatch::default()
        };
        assert!(!doc.apply_patch(&same));
        assert!(doc.apply_patch(&DocumentPatch::progress(4, 12)));
        assert_eq!(doc.processed, Some(4));
        assert_eq!(doc.name, "handbook.pdf");
    }

    #[test]
    fn dashboard_keeps_unknown_counters() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"total_connectors":3,"queued_jobs":7}"#,
        )
        .unwrap();
        assert_eq!(stats.total_connectors, 3);
        assert_eq!(stats.extra.get("queued_jobs"), Some(&Value::from(7)));
    }
}
