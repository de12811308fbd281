use std::collections::BTreeMap;

use sync_logging::{sync_debug, sync_trace, sync_warn};

use crate::activity::ActivityMarkers;
use crate::connection::ConnectionManager;
use crate::repository::{KeyedRepository, Reconciled, SnapshotSlot};
use crate::route::RouteOutcome;
use crate::tap::DebugTap;
use crate::throttle::ProgressThrottler;
use crate::view_model::{ConnectorRowView, DocumentRowView, SyncViewModel};
use crate::{
    AnalyticsSnapshot, Connector, DashboardStats, Document, Effect, EntityFamily, SyncSettings,
    WorkerHealth,
};

/// Counters for diagnostics; never reset except by a fresh [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub stale_frames: u64,
    pub unrecognized: u64,
    /// Reconciler invocations, whether or not they changed anything.
    pub reconciliations: u64,
    pub throttled: u64,
    pub rejected: u64,
    pub hydrations: u64,
    pub hydration_failures: u64,
}

/// Everything the synchronization core owns. One instance per `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub(crate) settings: SyncSettings,
    pub(crate) connection: ConnectionManager,
    pub(crate) connectors: KeyedRepository<Connector>,
    pub(crate) documents: KeyedRepository<Document>,
    pub(crate) dashboard: SnapshotSlot<DashboardStats>,
    pub(crate) analytics: SnapshotSlot<AnalyticsSnapshot>,
    pub(crate) workers: SnapshotSlot<WorkerHealth>,
    pub(crate) throttler: ProgressThrottler,
    pub(crate) activity: ActivityMarkers,
    pub(crate) tap: DebugTap,
    pub(crate) stats: SyncStats,
    /// REST requests per family still in flight. Releasing a family zeroes its count.
    pending_hydrations: BTreeMap<EntityFamily, u32>,
    dirty: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl SyncState {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            connection: ConnectionManager::new(&settings),
            connectors: KeyedRepository::new(),
            documents: KeyedRepository::new(),
            dashboard: SnapshotSlot::default(),
            analytics: SnapshotSlot::default(),
            workers: SnapshotSlot::default(),
            throttler: ProgressThrottler::new(settings.progress_interval()),
            activity: ActivityMarkers::default(),
            tap: DebugTap::new(settings.tap_capacity),
            stats: SyncStats::default(),
            pending_hydrations: BTreeMap::new(),
            dirty: false,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn connectors(&self) -> &KeyedRepository<Connector> {
        &self.connectors
    }

    pub fn documents(&self) -> &KeyedRepository<Document> {
        &self.documents
    }

    pub fn dashboard(&self) -> Option<&DashboardStats> {
        self.dashboard.get()
    }

    pub fn analytics(&self) -> Option<&AnalyticsSnapshot> {
        self.analytics.get()
    }

    pub fn workers(&self) -> Option<&WorkerHealth> {
        self.workers.get()
    }

    pub fn throttler(&self) -> &ProgressThrottler {
        &self.throttler
    }

    pub fn tap(&self) -> &DebugTap {
        &self.tap
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Whether a hydration for `family` was requested and has not come back yet.
    pub fn is_awaiting_hydration(&self, family: EntityFamily) -> bool {
        self.pending_hydrations.contains_key(&family)
    }

    pub fn is_recently_updated(&self, family: EntityFamily) -> bool {
        self.activity.is_active(family)
    }

    pub fn view(&self) -> SyncViewModel {
        let workers = self.workers.get();
        SyncViewModel {
            connection: self.connection.status(),
            attempt: self.connection.attempt(),
            retry_delay: self.connection.retry_delay(),
            reconnect_pending: self.connection.reconnect_pending(),
            connectors: self
                .connectors
                .iter()
                .map(|connector| ConnectorRowView {
                    id: connector.id.clone(),
                    name: connector.name.clone(),
                    status: connector.status.clone(),
                    document_count: connector.document_count,
                })
                .collect(),
            documents: self
                .documents
                .iter()
                .map(|document| DocumentRowView {
                    id: document.id.clone(),
                    name: document.name.clone(),
                    status: document.status.clone(),
                    progress_percent: document.progress_percent(),
                })
                .collect(),
            dashboard: self.dashboard.get().cloned(),
            analytics: self.analytics.get().cloned(),
            workers_alive: workers.map_or(0, WorkerHealth::alive_count),
            workers_total: workers.map_or(0, |health| health.workers.len()),
            active_families: self.activity.active().collect(),
            stats: self.stats,
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Books a routing result and returns the timer effect for the activity marker.
    pub(crate) fn record(&mut self, outcome: RouteOutcome) -> Vec<Effect> {
        match outcome {
            RouteOutcome::Applied { family, reconciled } => self.note_reconciled(family, reconciled),
            RouteOutcome::Throttled => {
                self.stats.throttled += 1;
                Vec::new()
            }
            RouteOutcome::Rejected { reason } => {
                self.stats.rejected += 1;
                sync_warn!("dropping notification: {reason}");
                Vec::new()
            }
            RouteOutcome::Unrouted => {
                self.stats.unrecognized += 1;
                Vec::new()
            }
        }
    }

    fn note_reconciled(&mut self, family: EntityFamily, reconciled: Reconciled) -> Vec<Effect> {
        self.stats.reconciliations += 1;
        if !reconciled.changed() {
            sync_trace!("{family}: reconciliation left cache as is ({reconciled:?})");
            return Vec::new();
        }
        self.dirty = true;
        let generation = self.activity.mark(family);
        vec![Effect::ScheduleActivityClear {
            family,
            generation,
            after: self.settings.activity_clear(),
        }]
    }

    pub(crate) fn request_hydration(&mut self, family: EntityFamily) -> Effect {
        *self.pending_hydrations.entry(family).or_default() += 1;
        Effect::Hydrate(family)
    }

    /// Books one response for `family`. False when nothing was outstanding, which
    /// means the family was released after the request went out.
    pub(crate) fn settle_hydration(&mut self, family: EntityFamily) -> bool {
        match self.pending_hydrations.get_mut(&family) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.pending_hydrations.remove(&family);
                true
            }
            None => false,
        }
    }

    /// Seeds a family from a REST body shaped like the push snapshots.
    pub(crate) fn hydrate(
        &mut self,
        family: EntityFamily,
        body: &str,
    ) -> Result<usize, serde_json::Error> {
        let count = match family {
            EntityFamily::Connectors => self.connectors.seed(serde_json::from_str(body)?),
            EntityFamily::Documents => {
                let count = self.documents.seed(serde_json::from_str(body)?);
                let documents = &self.documents;
                self.throttler.retain(|id| documents.contains(id));
                count
            }
            EntityFamily::Dashboard => {
                self.dashboard.replace(serde_json::from_str(body)?);
                1
            }
            EntityFamily::Analytics => {
                self.analytics.replace(serde_json::from_str(body)?);
                1
            }
            EntityFamily::Workers => {
                self.workers.replace(serde_json::from_str(body)?);
                1
            }
        };
        self.dirty = true;
        Ok(count)
    }

    pub(crate) fn release(&mut self, family: EntityFamily) {
        sync_debug!("releasing {family} cache");
        match family {
            EntityFamily::Connectors => self.connectors.clear(),
            EntityFamily::Documents => {
                self.documents.clear();
                self.throttler.clear();
            }
            EntityFamily::Dashboard => self.dashboard.clear(),
            EntityFamily::Analytics => self.analytics.clear(),
            EntityFamily::Workers => self.workers.clear(),
        }
        self.activity.clear(family);
        self.pending_hydrations.remove(&family);
        self.dirty = true;
    }

    pub(crate) fn release_all(&mut self) {
        for family in EntityFamily::ALL {
            self.release(family);
        }
        self.activity.clear_all();
    }
}
