use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use sync_logging::{sync_debug, sync_info, sync_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::hydrate::{Hydrator, ReqwestHydrator};
use crate::transport::{spawn_session, SessionControl, SessionSpec};
use crate::{EngineError, EngineEvent, EngineSettings, Resource};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

enum EngineCommand {
    Open { attempt: u64 },
    Close,
    Send(String),
    ScheduleReconnect { delay: Duration },
    CancelReconnect,
    ArmAlarm {
        resource: Resource,
        generation: u64,
        after: Duration,
    },
    Hydrate(Resource),
    Shutdown,
}

/// Cheap to clone; every clone feeds the same engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<(Self, mpsc::Receiver<EngineEvent>), EngineError> {
        settings.validate()?;
        let hydrator = ReqwestHydrator::new(&settings)?;
        Self::with_hydrator(settings, Arc::new(hydrator))
    }

    pub fn with_hydrator(
        settings: EngineSettings,
        hydrator: Arc<dyn Hydrator>,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sync-engine-io")
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("sync-engine".to_string())
            .spawn(move || {
                let mut worker = Worker::new(runtime, settings, hydrator, event_tx);
                while let Ok(command) = cmd_rx.recv() {
                    if !worker.handle(command) {
                        break;
                    }
                }
                worker.shutdown();
            })?;

        Ok((Self { cmd_tx }, event_rx))
    }

    pub fn open(&self, attempt: u64) {
        let _ = self.cmd_tx.send(EngineCommand::Open { attempt });
    }

    pub fn close(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Close);
    }

    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Send(text.into()));
    }

    pub fn schedule_reconnect(&self, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::ScheduleReconnect { delay });
    }

    pub fn cancel_reconnect(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CancelReconnect);
    }

    /// Reports `EngineEvent::AlarmFired` with the same resource and generation after `after`.
    pub fn arm_alarm(&self, resource: Resource, generation: u64, after: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::ArmAlarm {
            resource,
            generation,
            after,
        });
    }

    pub fn hydrate(&self, resource: Resource) {
        let _ = self.cmd_tx.send(EngineCommand::Hydrate(resource));
    }

    /// Cancels every timer, closes the transport and stops the engine thread.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

struct Worker {
    runtime: Runtime,
    settings: EngineSettings,
    hydrator: Arc<dyn Hydrator>,
    events: mpsc::Sender<EngineEvent>,
    /// Parent of every token handed out, so shutdown reaches all spawned tasks.
    root: CancellationToken,
    session: Option<SessionControl>,
    reconnect: Option<CancellationToken>,
}

impl Worker {
    fn new(
        runtime: Runtime,
        settings: EngineSettings,
        hydrator: Arc<dyn Hydrator>,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            runtime,
            settings,
            hydrator,
            events,
            root: CancellationToken::new(),
            session: None,
            reconnect: None,
        }
    }

    /// Returns false when the engine should stop.
    fn handle(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::Open { attempt } => {
                self.close_session();
                let spec = SessionSpec {
                    url: self.settings.ws_url.clone(),
                    attempt,
                    connect_timeout: self.settings.connect_timeout(),
                };
                self.session = Some(spawn_session(
                    self.runtime.handle(),
                    spec,
                    self.root.child_token(),
                    self.events.clone(),
                ));
            }
            EngineCommand::Close => self.close_session(),
            EngineCommand::Send(text) => {
                let delivered = match &self.session {
                    Some(session) => session.send(text),
                    None => false,
                };
                if !delivered {
                    sync_warn!("no live transport; dropping outbound control message");
                }
            }
            EngineCommand::ScheduleReconnect { delay } => {
                self.cancel_reconnect();
                let token = self.root.child_token();
                let cancelled = token.clone();
                let events = self.events.clone();
                self.runtime.spawn(async move {
                    tokio::select! {
                        _ = cancelled.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = events.send(EngineEvent::ReconnectDue);
                        }
                    }
                });
                self.reconnect = Some(token);
            }
            EngineCommand::CancelReconnect => self.cancel_reconnect(),
            EngineCommand::ArmAlarm {
                resource,
                generation,
                after,
            } => {
                let cancelled = self.root.child_token();
                let events = self.events.clone();
                self.runtime.spawn(async move {
                    tokio::select! {
                        _ = cancelled.cancelled() => {}
                        _ = tokio::time::sleep(after) => {
                            let _ = events.send(EngineEvent::AlarmFired { resource, generation });
                        }
                    }
                });
            }
            EngineCommand::Hydrate(resource) => {
                let hydrator = self.hydrator.clone();
                let events = self.events.clone();
                sync_debug!("hydrating {resource}");
                self.runtime.spawn(async move {
                    let result = hydrator.fetch(resource).await;
                    let _ = events.send(EngineEvent::Hydrated { resource, result });
                });
            }
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            sync_debug!("closing transport attempt {}", session.attempt());
            session.close();
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(token) = self.reconnect.take() {
            token.cancel();
        }
    }

    fn shutdown(mut self) {
        sync_info!("sync engine shutting down");
        self.close_session();
        self.cancel_reconnect();
        self.root.cancel();
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
    }
}
