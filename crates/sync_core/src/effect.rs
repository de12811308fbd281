use std::time::Duration;

use crate::EntityFamily;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a new push transport; every event it reports must carry `attempt`.
    OpenTransport { attempt: u64 },
    CloseTransport,
    SendControl(String),
    ScheduleReconnect { delay: Duration },
    CancelReconnect,
    /// Report `Msg::ActivityExpired` for this family and generation after `after`.
    ScheduleActivityClear {
        family: EntityFamily,
        generation: u64,
        after: Duration,
    },
    /// Fetch the family's full snapshot from the REST API.
    Hydrate(EntityFamily),
}
