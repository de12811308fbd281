use std::time::Duration;

use sync_engine::{EngineEvent, EngineHandle, EngineSettings, Resource};

fn engine() -> (EngineHandle, std::sync::mpsc::Receiver<EngineEvent>) {
    EngineHandle::new(EngineSettings::default()).expect("engine starts")
}

#[test]
fn reconnect_timer_fires() {
    let (engine, events) = engine();
    engine.schedule_reconnect(Duration::from_millis(20));

    let event = events.recv_timeout(Duration::from_secs(2)).expect("timer");
    assert_eq!(event, EngineEvent::ReconnectDue);
    engine.shutdown();
}

#[test]
fn cancelled_reconnect_never_fires() {
    let (engine, events) = engine();
    engine.schedule_reconnect(Duration::from_millis(150));
    engine.cancel_reconnect();

    assert!(events.recv_timeout(Duration::from_millis(400)).is_err());
    engine.shutdown();
}

#[test]
fn rescheduling_replaces_the_pending_timer() {
    let (engine, events) = engine();
    engine.schedule_reconnect(Duration::from_millis(50));
    engine.schedule_reconnect(Duration::from_millis(60));

    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).expect("timer"),
        EngineEvent::ReconnectDue
    );
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
    engine.shutdown();
}

#[test]
fn alarm_carries_its_generation_back() {
    let (engine, events) = engine();
    engine.arm_alarm(Resource::Documents, 4, Duration::from_millis(10));

    assert_eq!(
        events.recv_timeout(Duration::from_secs(2)).expect("alarm"),
        EngineEvent::AlarmFired {
            resource: Resource::Documents,
            generation: 4,
        }
    );
    engine.shutdown();
}
