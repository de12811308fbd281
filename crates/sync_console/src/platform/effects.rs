use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use sync_core::{Effect, EntityFamily, Msg};
use sync_engine::{EngineEvent, EngineHandle, Resource};
use sync_logging::{sync_debug, sync_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            sync_debug!("effect {:?}", effect);
            match effect {
                Effect::OpenTransport { attempt } => self.engine.open(attempt),
                Effect::CloseTransport => self.engine.close(),
                Effect::SendControl(command) => self.engine.send_text(command),
                Effect::ScheduleReconnect { delay } => self.engine.schedule_reconnect(delay),
                Effect::CancelReconnect => self.engine.cancel_reconnect(),
                Effect::ScheduleActivityClear {
                    family,
                    generation,
                    after,
                } => self.engine.arm_alarm(map_family(family), generation, after),
                Effect::Hydrate(family) => self.engine.hydrate(map_family(family)),
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

/// Forwards engine events into the message queue until either side hangs up.
pub fn spawn_event_pump(events: mpsc::Receiver<EngineEvent>, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Ok(event) = events.recv() {
            if msg_tx.send(map_event(event, Instant::now())).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: EngineEvent, received_at: Instant) -> Msg {
    match event {
        EngineEvent::Opened { attempt } => Msg::TransportOpened { attempt },
        EngineEvent::Frame { attempt, text } => Msg::FrameReceived {
            attempt,
            text,
            at: received_at,
        },
        EngineEvent::TransportError { attempt, message } => {
            Msg::TransportFailed { attempt, message }
        }
        EngineEvent::Closed { attempt, reason } => Msg::TransportClosed { attempt, reason },
        EngineEvent::ReconnectDue => Msg::ReconnectDue,
        EngineEvent::AlarmFired {
            resource,
            generation,
        } => Msg::ActivityExpired {
            family: map_resource(resource),
            generation,
        },
        EngineEvent::Hydrated { resource, result } => match result {
            Ok(body) => Msg::Hydrated {
                family: map_resource(resource),
                body,
            },
            Err(err) => {
                sync_warn!("REST hydration of {} failed: {}", resource, err);
                Msg::HydrationFailed {
                    family: map_resource(resource),
                    message: err.to_string(),
                }
            }
        },
    }
}

fn map_family(family: EntityFamily) -> Resource {
    match family {
        EntityFamily::Connectors => Resource::Connectors,
        EntityFamily::Documents => Resource::Documents,
        EntityFamily::Dashboard => Resource::DashboardStats,
        EntityFamily::Analytics => Resource::Analytics,
        EntityFamily::Workers => Resource::Workers,
    }
}

fn map_resource(resource: Resource) -> EntityFamily {
    match resource {
        Resource::Connectors => EntityFamily::Connectors,
        Resource::Documents => EntityFamily::Documents,
        Resource::DashboardStats => EntityFamily::Dashboard,
        Resource::Analytics => EntityFamily::Analytics,
        Resource::Workers => EntityFamily::Workers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_engine::HydrateError;

    #[test]
    fn families_and_resources_map_both_ways() {
        for family in EntityFamily::ALL {
            assert_eq!(map_resource(map_family(family)), family);
        }
    }

    #[test]
    fn failed_hydration_becomes_a_failure_message() {
        let msg = map_event(
            EngineEvent::Hydrated {
                resource: Resource::Documents,
                result: Err(HydrateError::HttpStatus(502)),
            },
            Instant::now(),
        );
        assert_eq!(
            msg,
            Msg::HydrationFailed {
                family: EntityFamily::Documents,
                message: "http status 502".to_string(),
            }
        );
    }

    #[test]
    fn frames_are_stamped_with_receive_time() {
        let at = Instant::now();
        let msg = map_event(
            EngineEvent::Frame {
                attempt: 2,
                text: "{}".to_string(),
            },
            at,
        );
        assert_eq!(
            msg,
            Msg::FrameReceived {
                attempt: 2,
                text: "{}".to_string(),
                at,
            }
        );
    }
}
