use std::time::Duration;

use crate::{AnalyticsSnapshot, ConnectionStatus, DashboardStats, EntityFamily, SyncStats};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncViewModel {
    pub connection: ConnectionStatus,
    pub attempt: u64,
    pub retry_delay: Duration,
    pub reconnect_pending: bool,
    pub connectors: Vec<ConnectorRowView>,
    pub documents: Vec<DocumentRowView>,
    pub dashboard: Option<DashboardStats>,
    pub analytics: Option<AnalyticsSnapshot>,
    pub workers_alive: usize,
    pub workers_total: usize,
    /// Families with an activity marker that has not expired yet.
    pub active_families: Vec<EntityFamily>,
    pub stats: SyncStats,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorRowView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub document_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRowView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub progress_percent: Option<u8>,
}
