//! Jumps, calls, returns and restarts. Taken branches load PC directly (see `Cpu::jump`), untaken ones fall through to
//! the normal PC advance. Conditional forms cost fewer cycles when the branch isn't taken.

use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, FlagCondition, Register16};
use crate::mmu::Mmu;

pub(crate) fn register(t: &mut OpcodeTable) {
    t.insert(0xC3, "JP nn", 3, jp);
    for op in (0xC2..=0xDA).step_by(8) {
        t.insert(op, "JP cc,nn", 3, jp_cc);
    }
    t.insert(0xE9, "JP (HL)", 1, jp_hl);

    t.insert(0x18, "JR e", 2, jr);
    for op in (0x20..=0x38).step_by(8) {
        t.insert(op, "JR cc,e", 2, jr_cc);
    }

    t.insert(0xCD, "CALL nn", 3, call);
    for op in (0xC4..=0xDC).step_by(8) {
        t.insert(op, "CALL cc,nn", 3, call_cc);
    }

    t.insert(0xC9, "RET", 1, ret);
    for op in (0xC0..=0xD8).step_by(8) {
        t.insert(op, "RET cc", 1, ret_cc);
    }
    t.insert(0xD9, "RETI", 1, reti);

    for op in (0xC7..=0xFF).step_by(8) {
        t.insert(op, "RST n", 1, rst);
    }
}

fn jp(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.imm16(mmu);
    cpu.jump(addr);
    4
}

fn jp_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    if cpu.check_condition(FlagCondition::from_index(op >> 3)) {
        jp(cpu, mmu, op)
    } else {
        3
    }
}

fn jp_hl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.register16_get(Register16::HL);
    cpu.jump(addr);
    1
}

// The offset is relative to the instruction following the JR.
fn jr(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let e = cpu.imm8(mmu) as i8;
    let addr = cpu.pc.wrapping_add(2).wrapping_add(e as u16);
    cpu.jump(addr);
    3
}

fn jr_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    if cpu.check_condition(FlagCondition::from_index(op >> 3)) {
        jr(cpu, mmu, op)
    } else {
        2
    }
}

fn call(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.imm16(mmu);
    let ret = cpu.pc.wrapping_add(3);
    cpu.push16(mmu, ret);
    cpu.jump(addr);
    6
}

fn call_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    if cpu.check_condition(FlagCondition::from_index(op >> 3)) {
        call(cpu, mmu, op)
    } else {
        3
    }
}

fn ret(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.pop16(mmu);
    cpu.jump(addr);
    4
}

fn ret_cc(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    if cpu.check_condition(FlagCondition::from_index(op >> 3)) {
        ret(cpu, mmu, op);
        5
    } else {
        2
    }
}

fn reti(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    cpu.ime = true;
    ret(cpu, mmu, op)
}

// The target is encoded in bits 3-5: 0x00, 0x08, ... 0x38.
fn rst(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let ret = cpu.pc.wrapping_add(1);
    cpu.push16(mmu, ret);
    cpu.jump(u16::from(op & 0x38));
    4
}
