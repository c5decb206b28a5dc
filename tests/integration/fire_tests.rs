//! Fire sequencer timing and failure behaviour.

use coilgun::app::events::SessionEvent;
use coilgun::control::fire::FireSequencer;

use super::mock_hw::{Line, PinWrite, RecordingSink, Rig, ms};

fn write(line: Line, high: bool, at: u64) -> PinWrite {
    PinWrite {
        line,
        high,
        at: ms(at),
    }
}

#[test]
fn pulse_follows_pre_delay_and_precedes_post_delay() {
    let rig = Rig::new();
    let mut charge = rig.charge_pin();
    let mut discharge = rig.discharge_pin();
    let mut clock = rig.clock.clone();
    let mut sink = RecordingSink::default();

    FireSequencer::from_millis(10, 10, 100)
        .run(&mut charge, &mut discharge, &mut clock, &mut sink)
        .unwrap();

    assert_eq!(
        rig.log.writes(),
        vec![
            write(Line::Charge, false, 0),
            write(Line::Discharge, true, 10),
            write(Line::Discharge, false, 20),
            write(Line::Charge, false, 20),
        ]
    );
    assert_eq!(rig.clock.elapsed(), ms(120));
    assert_eq!(
        sink.events,
        vec![
            SessionEvent::FireStarted {
                pre_delay: ms(10),
                pulse: ms(10),
                post_delay: ms(100),
            },
            SessionEvent::PulseOn,
            SessionEvent::PulseOff,
            SessionEvent::FireDone,
        ]
    );
}

#[test]
fn charge_line_is_never_high_during_fire() {
    let rig = Rig::new();
    let mut charge = rig.charge_pin();
    let mut discharge = rig.discharge_pin();
    let mut clock = rig.clock.clone();

    FireSequencer::from_millis(3, 7, 5)
        .run(&mut charge, &mut discharge, &mut clock, &mut RecordingSink::default())
        .unwrap();

    assert!(!rig.log.ever_high(Line::Charge));
    assert_eq!(rig.log.rising_edges(Line::Discharge), 1);
    assert!(rig.both_low());
}

#[test]
fn zero_delays_still_pulse_once() {
    let rig = Rig::new();
    let mut charge = rig.charge_pin();
    let mut discharge = rig.discharge_pin();
    let mut clock = rig.clock.clone();

    FireSequencer::from_millis(0, 0, 0)
        .run(&mut charge, &mut discharge, &mut clock, &mut RecordingSink::default())
        .unwrap();

    assert_eq!(rig.clock.elapsed(), ms(0));
    assert_eq!(rig.log.rising_edges(Line::Discharge), 1);
    assert!(rig.both_low());
}

#[test]
fn failed_pulse_write_aborts_without_waiting() {
    let rig = Rig::new();
    let mut charge = rig.charge_pin();
    let mut discharge = rig.discharge_pin().failing_on(1);
    let mut clock = rig.clock.clone();
    let mut sink = RecordingSink::default();

    let result = FireSequencer::from_millis(10, 10, 100).run(
        &mut charge,
        &mut discharge,
        &mut clock,
        &mut sink,
    );

    assert!(result.is_err());
    assert_eq!(rig.clock.elapsed(), ms(10));
    assert!(!rig.log.ever_high(Line::Discharge));
    assert_eq!(rig.log.level(Line::Discharge), Some(false));
    assert!(!sink.events.contains(&SessionEvent::PulseOn));
    assert!(!sink.events.contains(&SessionEvent::FireDone));
}

#[test]
fn failed_charge_write_aborts_before_pulse() {
    let rig = Rig::new();
    let mut charge = rig.charge_pin().failing_on(1);
    let mut discharge = rig.discharge_pin();
    let mut clock = rig.clock.clone();

    let result = FireSequencer::from_millis(10, 10, 100).run(
        &mut charge,
        &mut discharge,
        &mut clock,
        &mut RecordingSink::default(),
    );

    assert!(result.is_err());
    assert_eq!(rig.clock.elapsed(), ms(0));
    assert_eq!(rig.log.len(), 0);
}
