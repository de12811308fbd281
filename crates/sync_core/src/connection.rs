//! Connection lifecycle: Disconnected -> Connecting -> Connected -> Disconnected.
//!
//! The manager owns no sockets. It tracks which attempt is live and tells the
//! host what to do through [`Effect`]s; the host reports back with the attempt
//! number so late events from a previous transport can be ignored.
use std::time::Duration;

use sync_logging::{sync_debug, sync_info, sync_warn};

use crate::{Effect, SyncSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Exponential reconnect delay, capped, reset after every successful open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    multiplier: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, multiplier: u32) -> Self {
        let base = base.min(max);
        Self {
            base,
            max,
            multiplier: multiplier.max(1),
            current: base,
        }
    }

    /// Delay to use for the upcoming reconnect.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Returns the delay for this failure and grows the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(self.multiplier).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionManager {
    status: ConnectionStatus,
    backoff: Backoff,
    attempt: u64,
    established: u64,
    reconnect_pending: bool,
    torn_down: bool,
    refresh_command: Option<String>,
}

impl ConnectionManager {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            backoff: Backoff::new(
                settings.reconnect_base(),
                settings.reconnect_max(),
                settings.backoff_multiplier,
            ),
            attempt: 0,
            established: 0,
            reconnect_pending: false,
            torn_down: false,
            refresh_command: settings.refresh_command.clone(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Attempt number of the newest transport; events from any other attempt are stale.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// How many attempts reached Connected.
    pub fn established(&self) -> u64 {
        self.established
    }

    pub fn retry_delay(&self) -> Duration {
        self.backoff.current()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn is_current(&self, attempt: u64) -> bool {
        attempt == self.attempt
    }

    /// Idempotent: does nothing while a transport is open or being opened.
    pub fn connect(&mut self) -> Vec<Effect> {
        if self.status != ConnectionStatus::Disconnected {
            sync_debug!(
                "connect ignored: attempt {} is {:?}",
                self.attempt,
                self.status
            );
            return Vec::new();
        }
        self.torn_down = false;

        let mut effects = Vec::with_capacity(2);
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }
        self.attempt += 1;
        self.status = ConnectionStatus::Connecting;
        sync_info!("opening transport, attempt {}", self.attempt);
        effects.push(Effect::OpenTransport {
            attempt: self.attempt,
        });
        effects
    }

    /// Returns `None` when the event belongs to a stale or unexpected attempt.
    pub fn on_opened(&mut self, attempt: u64) -> Option<Vec<Effect>> {
        if !self.is_current(attempt) || self.status != ConnectionStatus::Connecting {
            sync_debug!("ignoring open for attempt {attempt} (current {})", self.attempt);
            return None;
        }
        self.status = ConnectionStatus::Connected;
        self.established += 1;
        self.backoff.reset();
        sync_info!("transport connected, attempt {attempt}");

        Some(
            self.refresh_command
                .iter()
                .map(|command| Effect::SendControl(command.clone()))
                .collect(),
        )
    }

    /// Transport errors force a close; the close path then runs as for any other drop.
    pub fn on_failed(&mut self, attempt: u64, message: &str) -> Vec<Effect> {
        if !self.is_current(attempt) || self.status == ConnectionStatus::Disconnected {
            return Vec::new();
        }
        sync_warn!("transport error on attempt {attempt}: {message}");
        vec![Effect::CloseTransport]
    }

    pub fn on_closed(&mut self, attempt: u64, reason: &str) -> Vec<Effect> {
        if !self.is_current(attempt) || self.status == ConnectionStatus::Disconnected {
            sync_debug!("ignoring close for attempt {attempt}: {reason}");
            return Vec::new();
        }
        self.status = ConnectionStatus::Disconnected;
        let mut effects = vec![Effect::CloseTransport];
        if self.torn_down {
            return effects;
        }

        let delay = self.backoff.next_delay();
        self.reconnect_pending = true;
        sync_warn!(
            "transport closed on attempt {attempt} ({reason}); reconnecting in {} ms",
            delay.as_millis()
        );
        effects.push(Effect::ScheduleReconnect { delay });
        effects
    }

    pub fn on_reconnect_due(&mut self) -> Vec<Effect> {
        if !self.reconnect_pending || self.torn_down {
            return Vec::new();
        }
        self.reconnect_pending = false;
        self.connect()
    }

    pub fn refresh(&self) -> Vec<Effect> {
        match (&self.refresh_command, self.status) {
            (Some(command), ConnectionStatus::Connected) => {
                vec![Effect::SendControl(command.clone())]
            }
            _ => Vec::new(),
        }
    }

    pub fn teardown(&mut self) -> Vec<Effect> {
        self.torn_down = true;
        let mut effects = Vec::with_capacity(2);
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }
        if self.status != ConnectionStatus::Disconnected {
            self.status = ConnectionStatus::Disconnected;
            effects.push(Effect::CloseTransport);
        }
        sync_info!("connection manager torn down");
        effects
    }
}
