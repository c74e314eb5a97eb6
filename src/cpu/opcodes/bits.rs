//! BIT, RES and SET (0xCB40 - 0xCBFF). Bits 3-5 of the opcode select the bit, bits 0-2 the operand.

use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, Flag, Operand};
use crate::mmu::Mmu;

pub(crate) fn register(t: &mut OpcodeTable) {
    for op in 0xCB40..=0xCB7F {
        t.insert(op, "BIT b,r", 2, bit);
    }
    for op in 0xCB80..=0xCBBF {
        t.insert(op, "RES b,r", 2, res);
    }
    for op in 0xCBC0..=0xCBFF {
        t.insert(op, "SET b,r", 2, set);
    }
}

fn cycles(o: Operand) -> u8 {
    if o.is_memory() {
        4
    } else {
        2
    }
}

// Z is set when the tested bit is clear. C is untouched.
fn bit(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op);
    let b = (op >> 3) & 7;
    let v = cpu.operand_get(mmu, o);
    cpu.update_flag(Flag::Z, v & (1 << b) == 0);
    cpu.reset_flag(Flag::N);
    cpu.set_flag(Flag::H);
    cycles(o)
}

fn res(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op);
    let b = (op >> 3) & 7;
    let v = cpu.operand_get(mmu, o);
    cpu.operand_set(mmu, o, v & !(1 << b));
    cycles(o)
}

fn set(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op);
    let b = (op >> 3) & 7;
    let v = cpu.operand_get(mmu, o);
    cpu.operand_set(mmu, o, v | (1 << b));
    cycles(o)
}
