//! Dispatch of decoded messages to the reconciler for their family.
use std::time::Instant;

use crate::envelope::{connector_patch, document_status_patch};
use crate::{DocumentPatch, EntityFamily, Message, Reconciled, SyncState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied {
        family: EntityFamily,
        reconciled: Reconciled,
    },
    /// A progress sample fell inside the throttling window and was discarded.
    Throttled,
    /// The payload decoded but cannot apply to its declared operation.
    Rejected { reason: String },
    /// No handler for this tag.
    Unrouted,
}

/// Routes one message. Synchronous, no I/O; every branch is a map operation.
pub fn route(state: &mut SyncState, message: Message, at: Instant) -> RouteOutcome {
    let (family, reconciled) = match message {
        Message::ConnectorCreated { connector } => {
            (EntityFamily::Connectors, state.connectors.upsert(connector))
        }
        Message::ConnectorUpdated { connector } => {
            (EntityFamily::Connectors, state.connectors.replace(connector))
        }
        Message::ConnectorStatus {
            id,
            status,
            document_count,
            last_sync_at,
            error_message,
        } => {
            let patch = connector_patch(status, document_count, last_sync_at, error_message);
            (EntityFamily::Connectors, state.connectors.patch(&id, &patch))
        }
        Message::ConnectorDeleted { id } => {
            (EntityFamily::Connectors, state.connectors.remove(&id))
        }
        Message::DocumentCreated { document } => {
            (EntityFamily::Documents, state.documents.upsert(document))
        }
        Message::DocumentUpdated { document } => {
            (EntityFamily::Documents, state.documents.replace(document))
        }
        Message::DocumentStatus {
            id,
            status,
            token_count,
            vector_count,
            updated_at,
            error_message,
        } => {
            let patch =
                document_status_patch(status, token_count, vector_count, updated_at, error_message);
            let reconciled = state.documents.patch(&id, &patch);
            if reconciled == Reconciled::Missing {
                state.throttler.forget(&id);
            }
            (EntityFamily::Documents, reconciled)
        }
        Message::DocumentProgress {
            id,
            processed,
            total,
        } => {
            if processed > total {
                return RouteOutcome::Rejected {
                    reason: format!("progress {processed}/{total} for `{id}` exceeds its total"),
                };
            }
            // Unknown ids never reach the throttler, so it only tracks cached documents.
            if !state.documents.contains(&id) {
                state.throttler.forget(&id);
                return RouteOutcome::Applied {
                    family: EntityFamily::Documents,
                    reconciled: Reconciled::Missing,
                };
            }
            match state.throttler.accept(&id, processed, total, at) {
                Some(sample) => {
                    let patch = DocumentPatch::progress(sample.processed, sample.total);
                    (EntityFamily::Documents, state.documents.patch(&id, &patch))
                }
                None => return RouteOutcome::Throttled,
            }
        }
        Message::DocumentDeleted { id } => {
            state.throttler.forget(&id);
            (EntityFamily::Documents, state.documents.remove(&id))
        }
        Message::WorkerHeartbeat { health } => (EntityFamily::Workers, state.workers.replace(health)),
        Message::DashboardStats { stats } => {
            (EntityFamily::Dashboard, state.dashboard.replace(stats))
        }
        Message::AnalyticsSnapshot { snapshot } => {
            (EntityFamily::Analytics, state.analytics.replace(snapshot))
        }
        Message::Unrecognized => return RouteOutcome::Unrouted,
    };

    RouteOutcome::Applied { family, reconciled }
}
