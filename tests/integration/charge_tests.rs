//! Charge phase against simulated hardware.

use coilgun::app::events::SessionEvent;
use coilgun::control::charge::ChargeController;
use coilgun::control::{Deadline, PhaseOutcome, PhaseReport};
use coilgun::error::TransportError;

use super::mock_hw::{COMMANDS, Line, RecordingSink, Rig, ScriptedRegister, bus_error, ms};

fn run(
    rig: &Rig,
    register: &mut ScriptedRegister,
    controller: ChargeController,
) -> (Result<PhaseReport, TransportError>, RecordingSink) {
    let mut pin = rig.charge_pin();
    let mut clock = rig.clock.clone();
    let mut sink = RecordingSink::default();
    let result = controller.run(register, COMMANDS.charge_level, &mut pin, &mut clock, &mut sink);
    (result, sink)
}

#[test]
fn level_at_target_completes_on_first_poll_without_charging() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 0x10);
    let (result, _) = run(&rig, &mut reg, ChargeController::new(0x10, Deadline::Unbounded));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Reached);
    assert_eq!(report.polls, 1);
    assert_eq!(report.activations, 0);
    assert_eq!(report.last_level, Some(0x10));
    assert!(!rig.log.ever_high(Line::Charge));
    assert_eq!(rig.log.level(Line::Charge), Some(false));
}

#[test]
fn zero_target_is_met_by_any_reading() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 0);
    let (result, _) = run(&rig, &mut reg, ChargeController::new(0, Deadline::Unbounded));
    let report = result.unwrap();
    assert_eq!(report.polls, 1);
    assert!(!rig.log.ever_high(Line::Charge));
}

#[test]
fn unreachable_target_stops_at_deadline_with_line_low() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 0x10);
    let (result, _) = run(&rig, &mut reg, ChargeController::new(0x20, Deadline::from_millis(50)));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::DeadlineElapsed);
    assert_eq!(report.elapsed, ms(50));
    assert_eq!(report.polls, 50);
    assert_eq!(report.activations, 1);
    assert_eq!(rig.log.level(Line::Charge), Some(false));
    assert_eq!(rig.log.of(Line::Charge).last().unwrap().at, ms(50));
}

#[test]
fn rising_level_stops_on_first_poll_at_target() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::rising(&rig.clock, 5, 1);
    let (result, sink) = run(&rig, &mut reg, ChargeController::new(12, Deadline::Unbounded));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Reached);
    assert_eq!(report.polls, 8);
    assert_eq!(report.last_level, Some(12));
    assert_eq!(rig.log.level(Line::Charge), Some(false));
    assert_eq!(rig.log.rising_edges(Line::Charge), 1);

    assert_eq!(
        sink.events[..3],
        [
            SessionEvent::ChargeStarted {
                target: 12,
                deadline: Deadline::Unbounded
            },
            SessionEvent::Charging { level: 5, target: 12 },
            SessionEvent::StopCharging { level: 12, target: 12 },
        ]
    );
    assert!(matches!(sink.events.last(), Some(SessionEvent::ChargeDone(r)) if *r == report));
}

#[test]
fn deadline_keeps_maintaining_after_target_and_recharges_on_sag() {
    let rig = Rig::new();
    // below, at, at, sagged, at ...
    let mut reg = ScriptedRegister::sequence(&rig.clock, &[10, 20, 20, 15, 20]);
    let (result, sink) = run(&rig, &mut reg, ChargeController::new(20, Deadline::from_millis(10)));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::DeadlineElapsed);
    assert_eq!(report.polls, 10);
    assert_eq!(report.activations, 2);
    assert_eq!(rig.log.rising_edges(Line::Charge), 2);
    assert_eq!(rig.log.level(Line::Charge), Some(false));

    let stops = sink
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::StopCharging { .. }))
        .count();
    assert_eq!(stops, 2);
}

#[test]
fn overshoot_is_bounded_by_one_poll_plus_one_read() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 0).with_latency(ms(3));
    let controller = ChargeController::new(100, Deadline::from_millis(10)).with_poll_interval(ms(1));
    let (result, _) = run(&rig, &mut reg, controller);
    let report = result.unwrap();

    assert!(report.elapsed >= ms(10));
    assert!(report.elapsed <= ms(10 + 1 + 3));
}

#[test]
fn read_error_propagates_and_drops_line_low() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::from_fn(&rig.clock, |n| if n < 3 { Ok(0) } else { Err(bus_error()) });
    let (result, sink) = run(&rig, &mut reg, ChargeController::new(50, Deadline::Unbounded));

    assert!(matches!(result, Err(TransportError::Io { .. })));
    assert!(rig.log.ever_high(Line::Charge));
    assert_eq!(rig.log.level(Line::Charge), Some(false));
    assert!(!sink.events.iter().any(|e| matches!(e, SessionEvent::ChargeDone(_))));
}

#[test]
fn polls_only_the_charge_level_register() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::rising(&rig.clock, 0, 4);
    let reads = reg.reads();
    let (result, _) = run(&rig, &mut reg, ChargeController::new(16, Deadline::Unbounded));
    result.unwrap();
    assert!(reads.borrow().iter().all(|c| *c == COMMANDS.charge_level));
}
