mod common;

use common::{early_padding, extended_machine, late_padding, magic, transfer_program, ON_TIME};
use coolcpu_core::{
    Access, EnginePhase, EngineRegister, Fault, NeverCancel, NullSink, RunOutcome, Variant,
    SECRET_SECTOR, SECTOR_SIZE,
};

fn ram_span(machine: &coolcpu_core::Machine, start: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| machine.peek(start + i as u8).expect("ram is readable"))
        .collect()
}

#[test]
fn on_time_pokes_with_magic_source_copy_the_secret() {
    let rom = transfer_program(magic(), 0x80, &ON_TIME);
    assert!(rom.len() <= 0x80);
    let mut machine = extended_machine(&rom);

    assert_eq!(machine.run(&NeverCancel, &mut NullSink), RunOutcome::Halted);
    assert_eq!(ram_span(&machine, 0x80, SECTOR_SIZE), SECRET_SECTOR.to_vec());
    assert_eq!(machine.engine().unwrap().phase(), EnginePhase::Idle);
    assert_eq!(machine.cycle(), 152);
}

#[test]
fn wrong_source_copies_zeros_over_existing_ram() {
    let rom = transfer_program(magic().wrapping_add(1), 0xA0, &ON_TIME);
    let mut machine = extended_machine(&rom);
    machine.memory_mut().load_ram(0xA0, &[0xAA; SECTOR_SIZE]).unwrap();

    assert_eq!(machine.run(&NeverCancel, &mut NullSink), RunOutcome::Halted);
    assert_eq!(ram_span(&machine, 0xA0, SECTOR_SIZE), vec![0; SECTOR_SIZE]);
}

#[test]
fn poke_one_cycle_early_faults() {
    let mut machine = extended_machine(&transfer_program(magic(), 0x80, &early_padding()));
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineTimingEarly {
            expected: 42,
            cycle: 41
        })
    );
    assert!(ram_span(&machine, 0x80, SECTOR_SIZE).iter().all(|b| *b == 0));
}

#[test]
fn poke_one_cycle_late_faults() {
    let mut machine = extended_machine(&transfer_program(magic(), 0x80, &late_padding()));
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineTimingLate {
            expected: 42,
            cycle: 43
        })
    );
}

#[test]
fn writing_src_while_armed_is_busy() {
    // CON 1; STA GO; STA SRC
    let mut machine = extended_machine(&[0x22, 0x01, 0x11, 0xF4, 0x11, 0xF3, 0xFF]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineBusy {
            register: EngineRegister::Src
        })
    );
    assert_eq!(machine.pc(), 0x04);
}

#[test]
fn rearming_while_armed_is_busy() {
    // STA GO; STA GO
    let mut machine = extended_machine(&[0x11, 0xF4, 0x11, 0xF4, 0xFF]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineBusy {
            register: EngineRegister::Go
        })
    );
}

#[test]
fn poke_without_go_is_not_armed() {
    // CON 5; STA POKE
    let mut machine = extended_machine(&[0x22, 0x05, 0x11, 0xF5, 0xFF]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineNotArmed)
    );
}

#[test]
fn first_poke_must_be_five() {
    // STA GO; CON 4; STA POKE
    let mut machine = extended_machine(&[0x11, 0xF4, 0x22, 0x04, 0x11, 0xF5, 0xFF]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineIndexMismatch {
            expected: 5,
            got: 4
        })
    );
}

#[test]
fn copy_into_rom_faults_as_protected_write() {
    let mut machine = extended_machine(&transfer_program(magic(), 0x70, &ON_TIME));
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::ProtectedWrite { addr: 0x70 })
    );
    assert_eq!(machine.engine().unwrap().phase(), EnginePhase::Copying);
}

#[test]
fn copy_running_off_the_end_of_ram_keeps_the_bytes_already_written() {
    let mut machine = extended_machine(&transfer_program(magic(), 0xE0, &ON_TIME));
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::IllegalAddress {
            addr: 0xF0,
            access: Access::Write
        })
    );
    assert_eq!(ram_span(&machine, 0xE0, 16), SECRET_SECTOR[..16].to_vec());
}

#[test]
fn copy_over_output_emits_then_hits_the_busy_engine() {
    let mut machine = extended_machine(&transfer_program(magic(), 0xF1, &ON_TIME));
    let mut out = Vec::new();
    assert_eq!(
        machine.run(&NeverCancel, &mut out),
        RunOutcome::Fault(Fault::EngineBusy {
            register: EngineRegister::Dst
        })
    );
    assert_eq!(out, vec![SECRET_SECTOR[0]]);
    assert_eq!(machine.engine().unwrap().phase(), EnginePhase::Copying);
}

#[test]
fn copy_landing_on_poke_faults_as_busy() {
    let mut machine = extended_machine(&transfer_program(magic().wrapping_add(1), 0xF5, &ON_TIME));
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::EngineBusy {
            register: EngineRegister::Poke
        })
    );
}

#[test]
fn engine_registers_are_unmapped_on_base() {
    let mut machine = coolcpu_core::Machine::new(Variant::Base, &[0x11, 0xF2, 0xFF]).unwrap();
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::IllegalAddress {
            addr: 0xF2,
            access: Access::Write
        })
    );
}

#[test]
fn engine_registers_are_write_only() {
    // LDA 0xF3
    let mut machine = extended_machine(&[0x01, 0xF3, 0xFF]);
    assert_eq!(
        machine.run(&NeverCancel, &mut NullSink),
        RunOutcome::Fault(Fault::IllegalAddress {
            addr: 0xF3,
            access: Access::Read
        })
    );
}

#[test]
fn snapshot_never_exposes_the_magic_sector() {
    let machine = extended_machine(&[0xFF]);
    let json = serde_json::to_value(machine.snapshot()).unwrap();
    let engine = json["engine"].as_object().unwrap();
    let mut keys: Vec<_> = engine.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, ["dst", "phase", "src"]);
    assert!(format!("{machine:?}").contains("MagicSector(..)"));
}
