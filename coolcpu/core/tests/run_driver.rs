mod common;

use common::{base_machine, extended_machine, PRINT_AT_0X93};
use coolcpu_core::{
    decode_program, Access, CancelFlag, Deadline, Fault, NeverCancel, NullSink, RunOutcome,
};
use std::thread;
use std::time::Duration;

#[test]
fn hello_world_halts_with_output() {
    let mut rom = Vec::new();
    for byte in b"hi!" {
        rom.extend_from_slice(&[0x22, *byte, 0x11, 0xF1]);
    }
    rom.push(0xFF);
    let mut machine = base_machine(&rom);
    let mut out = Vec::new();
    assert_eq!(machine.run(&NeverCancel, &mut out), RunOutcome::Halted);
    assert_eq!(out, b"hi!");
    assert_eq!(machine.cycle(), 7);
}

#[test]
fn string_loop_prints_seeded_ram() {
    let mut machine = base_machine(&decode_program(PRINT_AT_0X93).unwrap());
    machine.memory_mut().load_ram(0x93, b"hello\0").unwrap();
    let mut out = Vec::new();
    assert_eq!(machine.run(&NeverCancel, &mut out), RunOutcome::Halted);
    assert_eq!(out, b"hello");
    assert_eq!(machine.cycle(), 86);
}

#[test]
fn output_before_a_fault_is_kept() {
    // CON 'x'; STA OUTPUT; STA 0x00
    let mut machine = base_machine(&[0x22, b'x', 0x11, 0xF1, 0x11, 0x00]);
    let mut out = Vec::new();
    assert_eq!(
        machine.run(&NeverCancel, &mut out),
        RunOutcome::Fault(Fault::ProtectedWrite { addr: 0x00 })
    );
    assert_eq!(out, b"x");
    assert_eq!(machine.pc(), 0x04);
}

#[test]
fn deadline_stops_an_infinite_loop_and_keeps_output() {
    // CON '.'; STA OUTPUT; JP 0x02
    let mut machine = base_machine(&[0x22, b'.', 0x11, 0xF1, 0x30, 0x02]);
    let mut out = Vec::new();
    let outcome = machine.run(&Deadline::after(Duration::from_millis(20)), &mut out);
    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(!out.is_empty());
    assert!(out.iter().all(|b| *b == b'.'));
    assert!(!machine.is_halted());
    assert_eq!(machine.fault(), None);
}

#[test]
fn cancel_flag_from_another_thread() {
    let mut machine = extended_machine(&[0x30, 0x00]);
    let flag = CancelFlag::new();
    let remote = flag.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        remote.cancel();
    });
    assert_eq!(machine.run(&flag, &mut NullSink), RunOutcome::Cancelled);
    handle.join().unwrap();
    assert!(machine.cycle() > 0);
}

#[test]
fn rerunning_a_stopped_machine_changes_nothing() {
    let mut halted = base_machine(&[0x20, 0xFF]);
    assert_eq!(halted.run(&NeverCancel, &mut NullSink), RunOutcome::Halted);
    let before = halted.snapshot();
    assert_eq!(halted.run(&NeverCancel, &mut NullSink), RunOutcome::Halted);
    let after = halted.snapshot();
    assert_eq!(after.cycle, before.cycle);
    assert_eq!(after.registers, before.registers);
    assert_eq!(after.registers.pc, 0x01);

    let mut faulted = base_machine(&[0x01, 0xF1]);
    let fault = Fault::IllegalAddress {
        addr: 0xF1,
        access: Access::Read,
    };
    assert_eq!(faulted.run(&NeverCancel, &mut NullSink), RunOutcome::Fault(fault));
    assert_eq!(faulted.run(&NeverCancel, &mut NullSink), RunOutcome::Fault(fault));
    assert_eq!(faulted.cycle(), 0);
    assert_eq!(faulted.pc(), 0x00);

    // Faults at 0x02, away from the reset PC.
    let mut late_fault = base_machine(&[0x00, 0x00, 0x11, 0x00]);
    assert_eq!(
        late_fault.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::ProtectedWrite { addr: 0x00 })
    );
    let before = late_fault.snapshot();
    let _ = late_fault.run(&NeverCancel, &mut NullSink);
    assert_eq!(late_fault.snapshot(), before);
    assert_eq!(late_fault.pc(), 0x02);
}

#[test]
fn empty_rom_runs_into_ram_and_faults_at_the_end() {
    // All-zero ROM and RAM are NOPs; execution walks to 0xF0.
    let mut machine = base_machine(&[]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::IllegalAddress {
            addr: 0xF0,
            access: Access::Read
        })
    );
    assert_eq!(machine.cycle(), 0xF0);
}
