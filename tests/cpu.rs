mod common;

use common::*;
use dmgcore::cpu::table;
use dmgcore::cpu::{Operand, Register};
use dmgcore::{CpuError, Flag, Register16};
use paste;

#[test]
fn reset_zeroes_registers() {
    let mut m = machine_with(&[]);
    m.cpu.a = 0x12;
    m.cpu.f = 0xF0;
    m.cpu.h = 0x34;
    m.cpu.pc = 0x1234;
    m.cpu.sp = 0xFFFE;
    m.cpu.ime = true;
    m.cpu.reset();

    assert_eq!(m.cpu, dmgcore::Cpu::new());
    assert_eq!(m.cpu.pc, 0);
    assert_eq!(m.cpu.sp, 0);
    assert_eq!(m.cpu.f, 0);
    assert!(m.cpu.increment_pc);
}

macro_rules! flag_tests {
    ( $( $name:ident: $flag:expr, $mask:expr, )* ) => {
        $(
        paste::item! {
            #[test]
            fn [<flag_roundtrip_ $name>] () {
                let mut cpu = dmgcore::Cpu::new();
                cpu.set_flag($flag);
                assert_eq!(cpu.test_flag($flag), 1);
                assert_eq!(cpu.f, $mask);
                cpu.f = 0xF0;
                cpu.reset_flag($flag);
                assert_eq!(cpu.test_flag($flag), 0);
                assert_eq!(cpu.f, 0xF0 & !$mask);
                assert_eq!(cpu.f & 0x0F, 0);
            }
        }
        )*
    }
}

flag_tests! {
    z: Flag::Z, 0x80,
    n: Flag::N, 0x40,
    h: Flag::H, 0x20,
    c: Flag::C, 0x10,
}

#[test]
fn af_masks_low_nibble() {
    let mut cpu = dmgcore::Cpu::new();
    cpu.register16_set(Register16::AF, 0x12FF);
    assert_eq!(cpu.a, 0x12);
    assert_eq!(cpu.f, 0xF0);
    assert_eq!(cpu.register16_get(Register16::AF), 0x12F0);
}

#[test]
fn register_pairs_roundtrip() {
    let mut cpu = dmgcore::Cpu::new();
    cpu.register16_set(Register16::BC, 0x1234);
    cpu.register16_set(Register16::DE, 0x5678);
    cpu.register16_set(Register16::HL, 0x9ABC);
    cpu.register16_set(Register16::SP, 0xDEF0);
    assert_eq!((cpu.b, cpu.c, cpu.d, cpu.e, cpu.h, cpu.l), (0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC));
    assert_eq!(cpu.register16_get(Register16::BC), 0x1234);
    assert_eq!(cpu.register16_get(Register16::DE), 0x5678);
    assert_eq!(cpu.register16_get(Register16::HL), 0x9ABC);
    assert_eq!(cpu.sp, 0xDEF0);
}

#[test]
fn operand_index_encoding() {
    let expected = [
        Operand::Reg(Register::B),
        Operand::Reg(Register::C),
        Operand::Reg(Register::D),
        Operand::Reg(Register::E),
        Operand::Reg(Register::H),
        Operand::Reg(Register::L),
        Operand::IndirectHL,
        Operand::Reg(Register::A),
    ];
    for (idx, operand) in expected.iter().enumerate() {
        assert_eq!(Operand::from_index(idx as u8), *operand);
    }

    let mut m = machine_with(&[]);
    m.cpu.register16_set(Register16::HL, 0xC010);
    m.cpu.operand_set(&mut m.mmu, Operand::IndirectHL, 0x5A);
    assert_eq!(m.mmu.read8(0xC010), 0x5A);
    assert_eq!(m.cpu.operand_get(&m.mmu, Operand::IndirectHL), 0x5A);
}

#[test]
fn dispatch_table_coverage() {
    // 244 base opcodes (256 minus the 11 holes minus the 0xCB prefix) plus the full extended set.
    assert_eq!(table::implemented(), 244 + 256);
    assert!(table::lookup(0xCB).is_none());

    let bit = table::lookup(0xCB7C).unwrap();
    assert_eq!(bit.mnemonic, "BIT b,r");
    assert_eq!(bit.length, 2);
    assert_eq!(table::lookup(0xC3).unwrap().length, 3);
}

macro_rules! unimplemented_opcode_tests {
    ( $( $name:ident: $opcode:expr, )* ) => {
        $(
        paste::item! {
            #[test]
            fn [<unimplemented_opcode_ $name>] () {
                let mut m = machine_with(&[0x00, $opcode]);
                step(&mut m);
                let before = m.cpu.clone();

                assert_eq!(m.step(), Err(CpuError::UnimplementedOpcode { opcode: $opcode, pc: 1 }));
                assert_eq!(m.cpu, before);
                assert!(table::lookup($opcode).is_none());
            }
        }
        )*
    }
}

unimplemented_opcode_tests! {
    d3: 0xD3,
    db: 0xDB,
    dd: 0xDD,
    e3: 0xE3,
    e4: 0xE4,
    eb: 0xEB,
    ec: 0xEC,
    ed: 0xED,
    f4: 0xF4,
    fc: 0xFC,
    fd: 0xFD,
}

#[test]
fn ld_immediate_then_register() {
    // LD B,0x42; LD C,B
    let mut m = machine_with(&[0x06, 0x42, 0x48]);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.pc, 2);
    assert_eq!(step(&mut m).cycles, 1);
    assert_eq!(m.cpu.pc, 3);
    assert_eq!(m.cpu.c, 0x42);
}

#[test]
fn ld_indirect_hl_immediate() {
    // LD HL,0xC000; LD (HL),0x99; LD A,(HL)
    let mut m = machine_with(&[0x21, 0x00, 0xC0, 0x36, 0x99, 0x7E]);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.mmu.read8(0xC000), 0x99);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.a, 0x99);
    assert_eq!(m.cpu.pc, 6);
}

#[test]
fn ldi_and_ldd_adjust_hl() {
    // LD (HL+),A; LD (HL-),A
    let mut m = machine_with(&[0x22, 0x32]);
    m.cpu.a = 0x77;
    m.cpu.register16_set(Register16::HL, 0xC100);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.register16_get(Register16::HL), 0xC101);
    step(&mut m);
    assert_eq!(m.cpu.register16_get(Register16::HL), 0xC100);
    assert_eq!(m.mmu.read8(0xC100), 0x77);
    assert_eq!(m.mmu.read8(0xC101), 0x77);
}

#[test]
fn ldh_round_trip_through_zero_page() {
    // LDH (0x80),A; LD A,0; LDH A,(0x80)
    let mut m = machine_with(&[0xE0, 0x80, 0x3E, 0x00, 0xF0, 0x80]);
    m.cpu.a = 0xAB;
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.mmu.read8(0xFF80), 0xAB);
    step(&mut m);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.a, 0xAB);
    assert_eq!(m.cpu.pc, 6);
}

#[test]
fn ld_nn_sp_stores_little_endian() {
    let mut m = machine_with(&[0x08, 0x00, 0xC0]);
    m.cpu.sp = 0x1234;
    assert_eq!(step(&mut m).cycles, 5);
    assert_eq!(m.mmu.read8(0xC000), 0x34);
    assert_eq!(m.mmu.read8(0xC001), 0x12);
    assert_eq!(m.cpu.pc, 3);
}

#[test]
fn ld_hl_sp_offset_flags() {
    let mut m = machine_with(&[0xF8, 0x08]);
    m.cpu.sp = 0xFFF8;
    m.cpu.set_flag(Flag::Z);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.register16_get(Register16::HL), 0x0000);
    assert_eq!(m.cpu.test_flag(Flag::Z), 0);
    assert_eq!(m.cpu.test_flag(Flag::N), 0);
    assert_eq!(m.cpu.test_flag(Flag::H), 1);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);
}

#[test]
fn add_sp_negative_offset() {
    let mut m = machine_with(&[0xE8, 0xFF]);
    m.cpu.sp = 0x0000;
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.sp, 0xFFFF);
    assert_eq!(m.cpu.f, 0);
}

#[test]
fn push_bc_pop_af_masks_flags() {
    let mut m = machine_with(&[0xC5, 0xF1]);
    m.cpu.sp = 0xFFFE;
    m.cpu.register16_set(Register16::BC, 0x12FF);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.sp, 0xFFFC);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.sp, 0xFFFE);
    assert_eq!(m.cpu.a, 0x12);
    assert_eq!(m.cpu.f, 0xF0);
}

#[test]
fn jp_absolute() {
    let mut m = machine_with(&[0xC3, 0x50, 0x01]);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.pc, 0x0150);
    assert!(m.cpu.increment_pc);
}

#[test]
fn jp_conditional_not_taken() {
    // JP Z,0x0150 with Z clear
    let mut m = machine_with(&[0xCA, 0x50, 0x01]);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.pc, 3);
}

#[test]
fn jp_hl() {
    let mut m = machine_with(&[0xE9]);
    m.cpu.register16_set(Register16::HL, 0x4000);
    assert_eq!(step(&mut m).cycles, 1);
    assert_eq!(m.cpu.pc, 0x4000);
}

#[test]
fn jr_is_relative_to_next_instruction() {
    let mut m = machine_with(&[0x18, 0xFE]);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.pc, 0);

    let mut m = machine_with(&[0x18, 0x05]);
    step(&mut m);
    assert_eq!(m.cpu.pc, 7);
}

#[test]
fn jr_conditional_cycles() {
    // JR Z,+5 with Z clear, then set
    let mut m = machine_with(&[0x28, 0x05]);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.pc, 2);

    let mut m = machine_with(&[0x28, 0x05]);
    m.cpu.set_flag(Flag::Z);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.pc, 7);
}

#[test]
fn countdown_loop() {
    // LD B,3; loop: DEC B; JR NZ,loop; HALT
    let mut m = machine_with(&[0x06, 0x03, 0x05, 0x20, 0xFD, 0x76]);
    assert_eq!(run(&mut m, 7), 2 + 1 + 3 + 1 + 3 + 1 + 2);
    assert_eq!(m.cpu.pc, 5);
    assert_eq!(m.cpu.b, 0);
    assert_eq!(m.cpu.test_flag(Flag::Z), 1);
}

#[test]
fn call_and_return() {
    let mut program = vec![0; 0x20];
    program[..6].copy_from_slice(&[0x31, 0xFE, 0xFF, 0xCD, 0x10, 0x00]); // LD SP,0xFFFE; CALL 0x0010
    program[0x10] = 0xC9; // RET
    let mut m = machine_with(&program);

    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(step(&mut m).cycles, 6);
    assert_eq!(m.cpu.pc, 0x10);
    assert_eq!(m.cpu.sp, 0xFFFC);
    assert_eq!(m.mmu.read16(0xFFFC), 0x0006);

    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.pc, 6);
    assert_eq!(m.cpu.sp, 0xFFFE);
}

#[test]
fn call_conditional_not_taken() {
    // CALL NC,0x1000 with C set
    let mut m = machine_with(&[0xD4, 0x00, 0x10]);
    m.cpu.sp = 0xFFFE;
    m.cpu.set_flag(Flag::C);
    assert_eq!(step(&mut m).cycles, 3);
    assert_eq!(m.cpu.pc, 3);
    assert_eq!(m.cpu.sp, 0xFFFE);
}

#[test]
fn ret_conditional_cycles() {
    // RET Z
    let mut m = machine_with(&[0xC8]);
    m.cpu.sp = 0xFFFC;
    m.mmu.write16(0xFFFC, 0x1234);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.pc, 1);

    let mut m = machine_with(&[0xC8]);
    m.cpu.sp = 0xFFFC;
    m.mmu.write16(0xFFFC, 0x1234);
    m.cpu.set_flag(Flag::Z);
    assert_eq!(step(&mut m).cycles, 5);
    assert_eq!(m.cpu.pc, 0x1234);
    assert_eq!(m.cpu.sp, 0xFFFE);
}

#[test]
fn reti_enables_interrupts() {
    let mut m = machine_with(&[0xD9]);
    m.cpu.sp = 0xFFFC;
    m.mmu.write16(0xFFFC, 0x0200);
    assert_eq!(step(&mut m).cycles, 4);
    assert!(m.cpu.ime);
    assert_eq!(m.cpu.pc, 0x0200);
}

#[test]
fn rst_pushes_next_address() {
    let mut m = machine_with(&[0x00, 0xEF]); // NOP; RST 0x28
    m.cpu.sp = 0xFFFE;
    step(&mut m);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.pc, 0x28);
    assert_eq!(m.mmu.read16(0xFFFC), 0x0002);
}

#[test]
fn ei_di() {
    let mut m = machine_with(&[0xFB, 0xF3]);
    step(&mut m);
    assert!(m.cpu.ime);
    step(&mut m);
    assert!(!m.cpu.ime);
}

#[test]
fn halt_and_stop_only_advance_pc() {
    let mut m = machine_with(&[0x76, 0x10, 0x00, 0x00]);
    assert_eq!(step(&mut m).cycles, 1);
    assert_eq!(m.cpu.pc, 1);
    assert_eq!(step(&mut m).cycles, 1);
    assert_eq!(m.cpu.pc, 3);
}

#[test]
fn bit_0_b() {
    let mut m = machine_with(&[0xCB, 0x40]);
    m.cpu.b = 0x41;
    m.cpu.set_flag(Flag::N);
    m.cpu.set_flag(Flag::C);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.pc, 2);
    assert_eq!(m.cpu.test_flag(Flag::Z), 0);
    assert_eq!(m.cpu.test_flag(Flag::N), 0);
    assert_eq!(m.cpu.test_flag(Flag::H), 1);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    let mut m = machine_with(&[0xCB, 0x40]);
    m.cpu.b = 0x20;
    step(&mut m);
    assert_eq!(m.cpu.test_flag(Flag::Z), 1);
    assert_eq!(m.cpu.test_flag(Flag::H), 1);
    assert_eq!(m.cpu.b, 0x20);
}

macro_rules! bit_tests {
    ( $( $name:ident: $bit:expr, )* ) => {
        $(
        paste::item! {
            #[test]
            fn [<bit_ $name _a>] () {
                let opcode = 0x47 | ($bit << 3);
                let mut m = machine_with(&[0xCB, opcode, 0xCB, opcode]);
                m.cpu.a = 1 << $bit;
                step(&mut m);
                assert_eq!(m.cpu.test_flag(Flag::Z), 0);
                m.cpu.a = !(1 << $bit);
                step(&mut m);
                assert_eq!(m.cpu.test_flag(Flag::Z), 1);
            }
        }
        )*
    }
}

bit_tests! {
    b0: 0,
    b1: 1,
    b2: 2,
    b3: 3,
    b4: 4,
    b5: 5,
    b6: 6,
    b7: 7,
}

#[test]
fn bit_set_res_on_memory() {
    // LD HL,0xC000; SET 3,(HL); BIT 3,(HL); RES 3,(HL)
    let mut m = machine_with(&[0x21, 0x00, 0xC0, 0xCB, 0xDE, 0xCB, 0x5E, 0xCB, 0x9E]);
    step(&mut m);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.mmu.read8(0xC000), 0x08);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.cpu.test_flag(Flag::Z), 0);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.mmu.read8(0xC000), 0x00);
    assert_eq!(m.cpu.pc, 9);
}

#[test]
fn swap_a() {
    let mut m = machine_with(&[0xCB, 0x37]);
    m.cpu.a = 0xF1;
    m.cpu.set_flag(Flag::C);
    assert_eq!(step(&mut m).cycles, 2);
    assert_eq!(m.cpu.a, 0x1F);
    assert_eq!(m.cpu.f, 0);
}

#[test]
fn rotate_memory_cycles() {
    // LD HL,0xC000; RLC (HL)
    let mut m = machine_with(&[0x21, 0x00, 0xC0, 0xCB, 0x06]);
    m.mmu.write8(0xC000, 0x81);
    step(&mut m);
    assert_eq!(step(&mut m).cycles, 4);
    assert_eq!(m.mmu.read8(0xC000), 0x03);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);
}

#[test]
fn shifts() {
    // SLA B; SRA C; SRL D; RR E
    let mut m = machine_with(&[0xCB, 0x20, 0xCB, 0x29, 0xCB, 0x3A, 0xCB, 0x1B]);
    m.cpu.b = 0x80;
    m.cpu.c = 0x81;
    m.cpu.d = 0x01;
    m.cpu.e = 0x00;

    step(&mut m);
    assert_eq!(m.cpu.b, 0x00);
    assert_eq!(m.cpu.test_flag(Flag::Z), 1);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    step(&mut m);
    assert_eq!(m.cpu.c, 0xC0);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    step(&mut m);
    assert_eq!(m.cpu.d, 0x00);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    // Carry from the SRL rotates in at the top.
    step(&mut m);
    assert_eq!(m.cpu.e, 0x80);
    assert_eq!(m.cpu.test_flag(Flag::C), 0);
}

#[test]
fn accumulator_rotates_clear_zero() {
    // RLCA; RRCA; RLA; RRA
    let mut m = machine_with(&[0x07, 0x0F, 0x17, 0x1F]);
    m.cpu.a = 0x80;
    m.cpu.set_flag(Flag::Z);

    assert_eq!(step(&mut m).cycles, 1);
    assert_eq!(m.cpu.a, 0x01);
    assert_eq!(m.cpu.f, 0x10);

    step(&mut m);
    assert_eq!(m.cpu.a, 0x80);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    step(&mut m);
    assert_eq!(m.cpu.a, 0x01);
    assert_eq!(m.cpu.test_flag(Flag::C), 1);

    m.cpu.a = 0x00;
    m.cpu.reset_flag(Flag::C);
    step(&mut m);
    assert_eq!(m.cpu.a, 0x00);
    assert_eq!(m.cpu.test_flag(Flag::Z), 0);
}
