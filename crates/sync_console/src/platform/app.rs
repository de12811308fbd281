use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use sync_core::{update, EntityFamily, Msg};
use sync_engine::EngineHandle;
use sync_logging::{sync_info, sync_warn};

use super::config::{self, DEFAULT_CONFIG_FILENAME};
use super::effects::{spawn_event_pump, EffectRunner};
use super::logging;
use super::render;

/// Status lines are redrawn at most this often.
const RENDER_INTERVAL: Duration = Duration::from_millis(250);

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let config = config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    logging::initialize(config.log, config.level());
    sync_info!(
        "sync console starting: ws={} rest={}",
        config.engine.ws_url,
        config.engine.rest_base_url
    );

    let (engine, engine_events) =
        EngineHandle::new(config.engine.clone()).context("starting sync engine")?;
    let runner = EffectRunner::new(engine);
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_event_pump(engine_events, msg_tx.clone());
    spawn_command_reader(msg_tx.clone());

    // Background tick to throttle rendering.
    thread::spawn(move || {
        while msg_tx.send(Msg::Tick).is_ok() {
            thread::sleep(RENDER_INTERVAL);
        }
    });

    let (mut state, effects) = sync_core::init(config.sync.clone());
    runner.run(effects);

    // Single consumer: every message is applied in arrival order on this thread.
    while let Ok(msg) = msg_rx.recv() {
        let render_now = matches!(msg, Msg::Tick);
        let stopping = matches!(msg, Msg::TeardownRequested);
        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);

        if render_now && state.consume_dirty() {
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            println!("{}", render::status_line(&state.view(), &timestamp));
        }
        if stopping {
            break;
        }
    }

    runner.shutdown();
    sync_info!("sync console stopped");
    Ok(())
}

fn spawn_command_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(msg) => {
                    let quit = matches!(msg, Msg::TeardownRequested);
                    if msg_tx.send(msg).is_err() || quit {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => sync_warn!(
                    "unknown command `{}` (try: connect, refresh, release <family>, logout, quit)",
                    line.trim()
                ),
            }
        }
    });
}

fn parse_command(line: &str) -> Option<Msg> {
    let mut words = line.split_whitespace();
    let msg = match words.next()? {
        "connect" => Msg::ConnectRequested,
        "refresh" => Msg::RefreshRequested,
        "release" => Msg::FamilyReleased(EntityFamily::parse(words.next()?)?),
        "logout" => Msg::SessionEnded,
        "quit" | "exit" => Msg::TeardownRequested,
        _ => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command("connect"), Some(Msg::ConnectRequested));
        assert_eq!(parse_command("  quit "), Some(Msg::TeardownRequested));
        assert_eq!(
            parse_command("release documents"),
            Some(Msg::FamilyReleased(EntityFamily::Documents))
        );
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("release"), None);
        assert_eq!(parse_command("release widgets"), None);
        assert_eq!(parse_command("dance"), None);
    }
}
