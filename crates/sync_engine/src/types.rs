use std::fmt;

/// REST collections the engine can hydrate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Connectors,
    Documents,
    DashboardStats,
    Analytics,
    Workers,
}

impl Resource {
    /// Path relative to the REST base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Connectors => "connectors",
            Resource::Documents => "documents",
            Resource::DashboardStats => "dashboard/stats",
            Resource::Analytics => "analytics",
            Resource::Workers => "workers",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Opened {
        attempt: u64,
    },
    Frame {
        attempt: u64,
        text: String,
    },
    TransportError {
        attempt: u64,
        message: String,
    },
    /// Sent exactly once per opened attempt, whether or not it ever connected.
    Closed {
        attempt: u64,
        reason: String,
    },
    ReconnectDue,
    AlarmFired {
        resource: Resource,
        generation: u64,
    },
    Hydrated {
        resource: Resource,
        result: Result<String, HydrateError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrateError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid {field} `{url}`: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },
    #[error(transparent)]
    Hydrate(#[from] HydrateError),
}
