use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Host asked for a connection (no-op while one is open or opening).
    ConnectRequested,
    TransportOpened { attempt: u64 },
    /// One raw text frame, stamped with the time it was read off the socket.
    FrameReceived {
        attempt: u64,
        text: String,
        at: Instant,
    },
    TransportFailed { attempt: u64, message: String },
    TransportClosed { attempt: u64, reason: String },
    /// The scheduled reconnect timer fired.
    ReconnectDue,
    ActivityExpired {
        family: crate::EntityFamily,
        generation: u64,
    },
    /// REST hydration body for a family, same shape as push snapshots.
    Hydrated {
        family: crate::EntityFamily,
        body: String,
    },
    HydrationFailed {
        family: crate::EntityFamily,
        message: String,
    },
    /// The view owning this family unmounted; drop its cache.
    FamilyReleased(crate::EntityFamily),
    /// The user's session ended; drop every cache.
    SessionEnded,
    /// Ask the server to re-push aggregate status now.
    RefreshRequested,
    TeardownRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
