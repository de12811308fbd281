//! One websocket session per attempt, driven on the engine runtime.
use std::sync::mpsc::Sender;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use sync_logging::{sync_debug, sync_info, sync_warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::EngineEvent;

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Engine-side handle to a running session task.
pub(crate) struct SessionControl {
    attempt: u64,
    outbound: UnboundedSender<String>,
    cancel: CancellationToken,
}

impl SessionControl {
    pub(crate) fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Queues a text frame; false once the session task has ended.
    pub(crate) fn send(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }

    pub(crate) fn close(&self) {
        self.cancel.cancel();
    }
}

pub(crate) struct SessionSpec {
    pub url: String,
    pub attempt: u64,
    pub connect_timeout: Duration,
}

pub(crate) fn spawn_session(
    runtime: &Handle,
    spec: SessionSpec,
    cancel: CancellationToken,
    events: Sender<EngineEvent>,
) -> SessionControl {
    let (outbound, outbound_rx) = unbounded_channel();
    let attempt = spec.attempt;
    runtime.spawn(run_session(spec, outbound_rx, cancel.clone(), events));
    SessionControl {
        attempt,
        outbound,
        cancel,
    }
}

async fn run_session(
    spec: SessionSpec,
    mut outbound: UnboundedReceiver<String>,
    cancel: CancellationToken,
    events: Sender<EngineEvent>,
) {
    let reason = drive(&spec, &mut outbound, &cancel, &events).await;
    sync_info!("transport attempt {} closed: {reason}", spec.attempt);
    let _ = events.send(EngineEvent::Closed {
        attempt: spec.attempt,
        reason,
    });
}

/// Runs the session until it ends and returns why it ended.
async fn drive(
    spec: &SessionSpec,
    outbound: &mut UnboundedReceiver<String>,
    cancel: &CancellationToken,
    events: &Sender<EngineEvent>,
) -> String {
    let attempt = spec.attempt;
    let report = |message: String| {
        sync_warn!("transport attempt {attempt} error: {message}");
        let _ = events.send(EngineEvent::TransportError {
            attempt,
            message: message.clone(),
        });
        message
    };

    let connect = tokio::time::timeout(spec.connect_timeout, connect_async(spec.url.as_str()));
    let stream = tokio::select! {
        _ = cancel.cancelled() => return "cancelled before open".to_string(),
        result = connect => match result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(err)) => return report(err.to_string()),
            Err(_) => {
                return report(format!(
                    "connect timed out after {} ms",
                    spec.connect_timeout.as_millis()
                ))
            }
        },
    };
    let _ = events.send(EngineEvent::Opened { attempt });

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = tokio::time::timeout(CLOSE_GRACE, sink.send(Message::Close(None))).await;
                return "closed by client".to_string();
            }
            outgoing = outbound.recv() => {
                let Some(text) = outgoing else {
                    return "outbound channel closed".to_string();
                };
                if let Err(err) = sink.send(Message::Text(text.into())).await {
                    return report(err.to_string());
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(EngineEvent::Frame {
                        attempt,
                        text: text.as_str().to_owned(),
                    });
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        let _ = events.send(EngineEvent::Frame { attempt, text });
                    }
                    Err(_) => sync_debug!("attempt {attempt}: dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    return match frame {
                        Some(frame) => format!("server closed ({}): {}", frame.code, frame.reason.as_str()),
                        None => "server closed".to_string(),
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return report(err.to_string()),
                None => return "stream ended".to_string(),
            }
        }
    }
}
