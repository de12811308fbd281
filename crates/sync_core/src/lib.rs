//! Sync core: pure state machine for the push-channel synchronization client.
//!
//! Raw frames go in as [`Msg`]s, are decoded into [`Envelope`]s, routed to the
//! reconciler for their entity family and applied to in-memory caches. All I/O
//! is requested through [`Effect`]s and performed by the host.
mod activity;
mod connection;
mod effect;
mod entity;
mod envelope;
mod msg;
mod repository;
mod route;
mod settings;
mod state;
mod tap;
mod throttle;
mod update;
mod view_model;

pub use activity::ActivityMarkers;
pub use connection::{Backoff, ConnectionManager, ConnectionStatus};
pub use effect::Effect;
pub use entity::{
    AnalyticsSnapshot, Connector, ConnectorPatch, DashboardStats, Document, DocumentPatch,
    EntityFamily, EntityId, WorkerHealth, WorkerStatus,
};
pub use envelope::{decode, DecodeError, Envelope, Message, TAG_FIELD};
pub use msg::Msg;
pub use repository::{KeyedEntity, KeyedRepository, Reconciled, SnapshotSlot};
pub use route::{route, RouteOutcome};
pub use settings::SyncSettings;
pub use state::{SyncState, SyncStats};
pub use tap::{DebugTap, TapEntry};
pub use throttle::{ProgressSample, ProgressThrottler};
pub use update::{init, update};
pub use view_model::{ConnectorRowView, DocumentRowView, SyncViewModel};
