//! Rotates, shifts and SWAP. The four accumulator rotates (RLCA, RLA, RRCA, RRA) are single-byte opcodes that always
//! clear Z, everything else lives in the 0xCB extended set and sets Z from the result.

use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, Flag, Operand};
use crate::mmu::Mmu;

/// The CB 0x00 - 0x3F operations, indexed by bits 3-5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl ShiftOp {
    pub fn from_index(idx: u8) -> ShiftOp {
        match idx & 0b111 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Swap,
            _ => ShiftOp::Srl,
        }
    }
}

pub(crate) fn register(t: &mut OpcodeTable) {
    const MNEMONICS: [&str; 8] = ["RLC r", "RRC r", "RL r", "RR r", "SLA r", "SRA r", "SWAP r", "SRL r"];

    t.insert(0x07, "RLCA", 1, rlca);
    t.insert(0x17, "RLA", 1, rla);
    t.insert(0x0F, "RRCA", 1, rrca);
    t.insert(0x1F, "RRA", 1, rra);

    for op in 0xCB00..=0xCB3F {
        t.insert(op, MNEMONICS[((op >> 3) & 7) as usize], 2, shift_r);
    }
}

/// Runs a shift/rotate on v, setting all four flags. Returns the new value.
pub fn shift(cpu: &mut Cpu, op: ShiftOp, v: u8) -> u8 {
    let carry_in = cpu.test_flag(Flag::C);
    let (result, carry) = match op {
        ShiftOp::Rlc => (v.rotate_left(1), v & 0x80 > 0),
        ShiftOp::Rrc => (v.rotate_right(1), v & 1 > 0),
        ShiftOp::Rl => ((v << 1) | carry_in, v & 0x80 > 0),
        ShiftOp::Rr => ((v >> 1) | (carry_in << 7), v & 1 > 0),
        ShiftOp::Sla => (v << 1, v & 0x80 > 0),
        ShiftOp::Sra => ((v >> 1) | (v & 0x80), v & 1 > 0),
        ShiftOp::Swap => (v.rotate_left(4), false),
        ShiftOp::Srl => (v >> 1, v & 1 > 0),
    };
    cpu.set_flags(result == 0, false, false, carry);
    result
}

fn shift_r(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op);
    let v = cpu.operand_get(mmu, o);
    let result = shift(cpu, ShiftOp::from_index(op >> 3), v);
    cpu.operand_set(mmu, o, result);
    if o.is_memory() {
        4
    } else {
        2
    }
}

fn accumulator(cpu: &mut Cpu, op: ShiftOp) -> u8 {
    let v = cpu.a;
    let result = shift(cpu, op, v);
    cpu.a = result;
    cpu.reset_flag(Flag::Z);
    1
}

fn rlca(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    accumulator(cpu, ShiftOp::Rlc)
}

fn rla(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    accumulator(cpu, ShiftOp::Rl)
}

fn rrca(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    accumulator(cpu, ShiftOp::Rrc)
}

fn rra(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    accumulator(cpu, ShiftOp::Rr)
}
