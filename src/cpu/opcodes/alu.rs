//! 8-bit and 16-bit arithmetic/logic. The flag rules are where most of the subtlety lives:
//!   * H is the carry out of bit 3 (bit 11 for 16-bit adds), or the borrow into bit 4 for subtraction.
//!   * C is the carry out of bit 7 (bit 15), or a borrow for subtraction.
//!   * N is set by subtraction-like operations only, DAA uses it to know which way to adjust.

use super::load::sp_offset;
use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, Flag, Operand, Register16};
use crate::mmu::Mmu;

/// The 8 accumulator operations, in the order they're encoded in bits 3-5 of 0x80 - 0xBF (and 0xC6 - 0xFE).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub fn from_index(idx: u8) -> AluOp {
        match idx & 0b111 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

pub(crate) fn register(t: &mut OpcodeTable) {
    const MNEMONICS: [(&str, &str); 8] = [
        ("ADD A,r", "ADD A,n"),
        ("ADC A,r", "ADC A,n"),
        ("SUB r", "SUB n"),
        ("SBC A,r", "SBC A,n"),
        ("AND r", "AND n"),
        ("XOR r", "XOR n"),
        ("OR r", "OR n"),
        ("CP r", "CP n"),
    ];

    for op in 0x80..=0xBF {
        t.insert(op, MNEMONICS[((op >> 3) & 7) as usize].0, 1, alu_r);
    }
    for op in (0xC6..=0xFE).step_by(8) {
        t.insert(op, MNEMONICS[((op >> 3) & 7) as usize].1, 2, alu_n);
    }

    for op in (0x04..=0x3C).step_by(8) {
        t.insert(op, "INC r", 1, inc_r);
    }
    for op in (0x05..=0x3D).step_by(8) {
        t.insert(op, "DEC r", 1, dec_r);
    }

    for op in (0x03..=0x33).step_by(0x10) {
        t.insert(op, "INC rr", 1, inc_rr);
    }
    for op in (0x0B..=0x3B).step_by(0x10) {
        t.insert(op, "DEC rr", 1, dec_rr);
    }
    for op in (0x09..=0x39).step_by(0x10) {
        t.insert(op, "ADD HL,rr", 1, add_hl_rr);
    }
    t.insert(0xE8, "ADD SP,e", 2, add_sp_e);

    t.insert(0x27, "DAA", 1, daa);
    t.insert(0x2F, "CPL", 1, cpl);
}

/// Applies an accumulator operation with operand v, updating A (except for CP) and all four flags.
pub fn alu8(cpu: &mut Cpu, op: AluOp, v: u8) {
    let a = cpu.a;
    match op {
        AluOp::Add | AluOp::Adc => {
            let carry = if op == AluOp::Adc { cpu.test_flag(Flag::C) } else { 0 };
            let result = u16::from(a) + u16::from(v) + u16::from(carry);
            let half = (a & 0xF) + (v & 0xF) + carry > 0xF;
            cpu.a = result as u8;
            cpu.set_flags(cpu.a == 0, false, half, result > 0xFF);
        }
        AluOp::Sub | AluOp::Sbc | AluOp::Cp => {
            let carry = if op == AluOp::Sbc { cpu.test_flag(Flag::C) } else { 0 };
            let result = a.wrapping_sub(v).wrapping_sub(carry);
            let half = (a & 0xF) < (v & 0xF) + carry;
            let borrow = u16::from(a) < u16::from(v) + u16::from(carry);
            if op != AluOp::Cp {
                cpu.a = result;
            }
            cpu.set_flags(result == 0, true, half, borrow);
        }
        AluOp::And => {
            cpu.a = a & v;
            cpu.set_flags(cpu.a == 0, false, true, false);
        }
        AluOp::Xor => {
            cpu.a = a ^ v;
            cpu.set_flags(cpu.a == 0, false, false, false);
        }
        AluOp::Or => {
            cpu.a = a | v;
            cpu.set_flags(cpu.a == 0, false, false, false);
        }
    }
}

fn alu_r(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let src = Operand::from_index(op);
    let v = cpu.operand_get(mmu, src);
    alu8(cpu, AluOp::from_index(op >> 3), v);
    if src.is_memory() {
        2
    } else {
        1
    }
}

fn alu_n(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let v = cpu.imm8(mmu);
    alu8(cpu, AluOp::from_index(op >> 3), v);
    2
}

// INC and DEC leave C alone.
fn inc_r(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op >> 3);
    let v = cpu.operand_get(mmu, o);
    let result = v.wrapping_add(1);
    cpu.operand_set(mmu, o, result);
    cpu.update_flag(Flag::Z, result == 0);
    cpu.reset_flag(Flag::N);
    cpu.update_flag(Flag::H, v & 0xF == 0xF);
    if o.is_memory() {
        3
    } else {
        1
    }
}

fn dec_r(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let o = Operand::from_index(op >> 3);
    let v = cpu.operand_get(mmu, o);
    let result = v.wrapping_sub(1);
    cpu.operand_set(mmu, o, result);
    cpu.update_flag(Flag::Z, result == 0);
    cpu.set_flag(Flag::N);
    cpu.update_flag(Flag::H, v & 0xF == 0);
    if o.is_memory() {
        3
    } else {
        1
    }
}

// 16-bit increments don't touch the flags at all.
fn inc_rr(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u8 {
    let reg = Register16::from_index(op >> 4, false);
    let v = cpu.register16_get(reg).wrapping_add(1);
    cpu.register16_set(reg, v);
    2
}

fn dec_rr(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u8 {
    let reg = Register16::from_index(op >> 4, false);
    let v = cpu.register16_get(reg).wrapping_sub(1);
    cpu.register16_set(reg, v);
    2
}

fn add_hl_rr(cpu: &mut Cpu, _: &mut Mmu, op: u8) -> u8 {
    let hl = cpu.register16_get(Register16::HL);
    let v = cpu.register16_get(Register16::from_index(op >> 4, false));
    let (result, carry) = hl.overflowing_add(v);
    cpu.reset_flag(Flag::N);
    cpu.update_flag(Flag::H, (hl & 0xFFF) + (v & 0xFFF) > 0xFFF);
    cpu.update_flag(Flag::C, carry);
    cpu.register16_set(Register16::HL, result);
    2
}

fn add_sp_e(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let e = cpu.imm8(mmu);
    let sp = sp_offset(cpu, e);
    cpu.sp = sp;
    4
}

/// Decimal adjust: fixes up A after a BCD add or subtract so each nibble is a valid decimal digit again. The previous
/// operation's N, H and C tell us which corrections apply.
fn daa(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    let mut a = cpu.a;
    let mut carry = cpu.flag(Flag::C);

    if !cpu.flag(Flag::N) {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if cpu.flag(Flag::H) || a & 0x0F > 0x09 {
            a = a.wrapping_add(0x06);
        }
    } else {
        if carry {
            a = a.wrapping_sub(0x60);
        }
        if cpu.flag(Flag::H) {
            a = a.wrapping_sub(0x06);
        }
    }

    cpu.a = a;
    cpu.update_flag(Flag::Z, a == 0);
    cpu.reset_flag(Flag::H);
    cpu.update_flag(Flag::C, carry);
    1
}

fn cpl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    cpu.a = !cpu.a;
    cpu.set_flag(Flag::N);
    cpu.set_flag(Flag::H);
    1
}
