//! Discharge phase against simulated hardware.

use coilgun::app::events::SessionEvent;
use coilgun::control::discharge::DischargeController;
use coilgun::control::{Deadline, PhaseOutcome, PhaseReport};
use coilgun::error::TransportError;

use super::mock_hw::{COMMANDS, Line, RecordingSink, Rig, ScriptedRegister, bus_error, ms};

fn run(
    rig: &Rig,
    register: &mut ScriptedRegister,
    controller: DischargeController,
) -> (Result<PhaseReport, TransportError>, RecordingSink) {
    let mut pin = rig.discharge_pin();
    let mut clock = rig.clock.clone();
    let mut sink = RecordingSink::default();
    let result = controller.run(register, COMMANDS.charge_level, &mut pin, &mut clock, &mut sink);
    (result, sink)
}

#[test]
fn already_at_floor_never_energises_the_line() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 2);
    let (result, sink) = run(&rig, &mut reg, DischargeController::new(3, Deadline::Unbounded));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Reached);
    assert_eq!(report.polls, 1);
    assert_eq!(report.activations, 0);
    assert!(!rig.log.ever_high(Line::Discharge));
    assert_eq!(rig.log.level(Line::Discharge), Some(false));
    assert!(sink.events.contains(&SessionEvent::Discharged { level: 2, target: 3 }));
}

#[test]
fn falling_level_stops_on_first_poll_at_floor() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::falling(&rig.clock, 10, 1);
    let (result, sink) = run(&rig, &mut reg, DischargeController::new(3, Deadline::Unbounded));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Reached);
    assert_eq!(report.polls, 8);
    assert_eq!(report.last_level, Some(3));
    assert_eq!(report.activations, 1);
    assert_eq!(report.elapsed, ms(7));
    assert_eq!(rig.log.rising_edges(Line::Discharge), 1);
    assert_eq!(rig.log.level(Line::Discharge), Some(false));

    assert_eq!(
        sink.events,
        vec![
            SessionEvent::DischargeStarted {
                target: 3,
                deadline: Deadline::Unbounded
            },
            SessionEvent::Discharging { level: 10, target: 3 },
            SessionEvent::Discharged { level: 3, target: 3 },
            SessionEvent::DischargeDone(report),
        ]
    );
}

#[test]
fn stuck_level_gives_up_at_deadline() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 40);
    let (result, sink) = run(&rig, &mut reg, DischargeController::new(3, Deadline::from_millis(20)));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::DeadlineElapsed);
    assert_eq!(report.polls, 20);
    assert_eq!(report.elapsed, ms(20));
    assert_eq!(report.last_level, Some(40));
    assert_eq!(rig.log.level(Line::Discharge), Some(false));
    assert!(!sink.events.iter().any(|e| matches!(e, SessionEvent::Discharged { .. })));
}

#[test]
fn deadline_does_not_keep_polling_after_floor() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::sequence(&rig.clock, &[10, 9, 2, 9]);
    let (result, _) = run(&rig, &mut reg, DischargeController::new(3, Deadline::from_millis(100)));
    let report = result.unwrap();

    assert_eq!(report.outcome, PhaseOutcome::Reached);
    assert_eq!(report.polls, 3);
    assert_eq!(report.elapsed, ms(2));
}

#[test]
fn read_error_propagates_and_drops_line_low() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::from_fn(&rig.clock, |n| if n == 1 { Ok(30) } else { Err(bus_error()) });
    let (result, _) = run(&rig, &mut reg, DischargeController::new(3, Deadline::Unbounded));

    assert!(result.is_err());
    assert!(rig.log.ever_high(Line::Discharge));
    assert_eq!(rig.log.level(Line::Discharge), Some(false));
}

#[test]
fn line_write_failure_aborts_the_phase() {
    let rig = Rig::new();
    let mut reg = ScriptedRegister::constant(&rig.clock, 30);
    let mut pin = rig.discharge_pin().failing_on(1);
    let mut clock = rig.clock.clone();
    let mut sink = RecordingSink::default();

    let result = DischargeController::new(3, Deadline::Unbounded).run(
        &mut reg,
        COMMANDS.charge_level,
        &mut pin,
        &mut clock,
        &mut sink,
    );

    assert!(matches!(result, Err(TransportError::ShortTransfer { .. })));
    assert!(!rig.log.ever_high(Line::Discharge));
    assert_eq!(rig.log.level(Line::Discharge), Some(false));
}
