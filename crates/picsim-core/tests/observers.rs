//! Change notification observed through the engine's blocks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use picsim_core::{
    Bank, ChangeEvent, CoreConfig, DataLocation, Engine, Observable, Register, RunBoundary,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn ready_engine(program: &[u16]) -> Engine {
    let engine = Engine::new(CoreConfig {
        program_memory_words: 64,
        ..CoreConfig::default()
    });
    engine.load(program).unwrap();
    engine.reset();
    engine
}

#[test]
fn gpr_store_reports_both_banks() {
    // MOVLW 0x3C; MOVWF 0x20
    let engine = ready_engine(&[0x303C, 0x00A0]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.data_memory().subscribe(move |event| {
        if event.location.address == 0x20 {
            sink.lock().unwrap().push(*event);
        }
    });

    engine.run(2, |_| false).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ChangeEvent::new(DataLocation::new(Bank::Bank0, 0x20), 0, 0x3C),
            ChangeEvent::new(DataLocation::new(Bank::Bank1, 0x20), 0, 0x3C),
        ]
    );
}

#[test]
fn register_events_follow_fetch_then_execute() {
    let engine = ready_engine(&[0x3042]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine
        .registers()
        .subscribe(move |event| sink.lock().unwrap().push(event.location));

    engine.step().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Register::InstructionRegister,
            Register::ProgramCounter,
            Register::W,
            Register::ProgramCounter,
        ]
    );
}

#[test]
fn call_stack_events_mark_push_and_pop() {
    // CALL 2; NOP; RETURN
    let engine = ready_engine(&[0x2002, 0x0000, 0x0008]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine
        .call_stack()
        .subscribe(move |event| sink.lock().unwrap().push(*event));

    engine.run(2, |_| false).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ChangeEvent::new(0, None, Some(1)),
            ChangeEvent::new(0, Some(1), None),
        ]
    );
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let engine = ready_engine(&[0x3001, 0x3002]);
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    let id = engine.registers().subscribe(move |event| {
        if event.location == Register::W {
            sink.fetch_add(1, Ordering::SeqCst);
        }
    });

    engine.step().unwrap();
    assert!(engine.registers().unsubscribe(id));
    engine.step().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(engine.w(), 2);
}

#[test]
fn listener_may_read_the_emitting_block() {
    let engine = ready_engine(&[0x30AB, 0x00A0]);
    let data = Arc::clone(engine.data_memory());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.data_memory().subscribe(move |event| {
        let current = data.get_at(event.location).unwrap();
        sink.lock().unwrap().push(current == event.new);
    });

    engine.run(2, |_| false).unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|consistent| *consistent));
}

#[test]
fn reset_reports_cleared_cells() {
    let engine = ready_engine(&[0x30FF, 0x00A0]);
    engine.run(2, |_| false).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.data_memory().subscribe(move |event| {
        if event.location.address == 0x20 {
            sink.lock().unwrap().push((event.old, event.new));
        }
    });
    engine.reset();

    assert_eq!(*seen.lock().unwrap(), vec![(0xFF, 0), (0xFF, 0)]);
}

#[test]
fn stop_request_from_another_thread_ends_a_run() {
    // loop: INCF 0x20,F; GOTO loop
    let engine = Arc::new(ready_engine(&[0x0AA0, 0x2800]));
    let runner = Arc::clone(&engine);
    let handle = thread::spawn(move || runner.run(usize::MAX, |_| false));

    while engine.cycles() == 0 {
        thread::yield_now();
    }
    let observed_w = engine.w();
    engine.request_stop();

    let outcome = handle.join().unwrap().unwrap();
    assert_eq!(outcome.boundary, RunBoundary::StopRequested);
    assert_eq!(outcome.faults, 0);
    assert_eq!(observed_w, 0);
}

#[test]
fn load_from_another_thread_stops_a_run_before_the_new_image() {
    for _ in 0..50 {
        // loop: NOP; GOTO loop
        let engine = Arc::new(ready_engine(&[0x0000, 0x2800]));
        let runner = Arc::clone(&engine);
        let handle = thread::spawn(move || runner.run(usize::MAX, |_| false));

        while engine.cycles() == 0 {
            thread::yield_now();
        }
        // MOVLW 0x77 everywhere
        engine.load(&[0x3077; 16]).unwrap();

        let outcome = handle.join().unwrap().unwrap();
        assert_eq!(outcome.boundary, RunBoundary::StopRequested);
        assert_eq!(engine.w(), 0);
        assert!(matches!(engine.instruction_register(), 0x0000 | 0x2800));
    }
}
