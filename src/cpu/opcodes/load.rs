//! 8-bit and 16-bit loads, plus the stack push/pop instructions.

use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, Flag, Operand, Register16};
use crate::mmu::Mmu;

pub(crate) fn register(t: &mut OpcodeTable) {
    for op in 0x40..=0x7F {
        // 0x76 would be LD (HL),(HL), which is HALT instead.
        if op != 0x76 {
            t.insert(op, "LD r,r'", 1, ld_r_r);
        }
    }
    for op in (0x06..=0x3E).step_by(8) {
        t.insert(op, "LD r,n", 2, ld_r_n);
    }

    t.insert(0x02, "LD (BC),A", 1, ld_bc_a);
    t.insert(0x12, "LD (DE),A", 1, ld_de_a);
    t.insert(0x0A, "LD A,(BC)", 1, ld_a_bc);
    t.insert(0x1A, "LD A,(DE)", 1, ld_a_de);
    t.insert(0x22, "LD (HL+),A", 1, ldi_hl_a);
    t.insert(0x2A, "LD A,(HL+)", 1, ldi_a_hl);
    t.insert(0x32, "LD (HL-),A", 1, ldd_hl_a);
    t.insert(0x3A, "LD A,(HL-)", 1, ldd_a_hl);

    t.insert(0xE0, "LDH (n),A", 2, ldh_n_a);
    t.insert(0xF0, "LDH A,(n)", 2, ldh_a_n);
    t.insert(0xE2, "LD (C),A", 1, ld_c_a);
    t.insert(0xF2, "LD A,(C)", 1, ld_a_c);
    t.insert(0xEA, "LD (nn),A", 3, ld_nn_a);
    t.insert(0xFA, "LD A,(nn)", 3, ld_a_nn);

    for op in (0x01..=0x31).step_by(0x10) {
        t.insert(op, "LD rr,nn", 3, ld_rr_nn);
    }
    t.insert(0x08, "LD (nn),SP", 3, ld_nn_sp);
    t.insert(0xF9, "LD SP,HL", 1, ld_sp_hl);
    t.insert(0xF8, "LD HL,SP+e", 2, ld_hl_sp_e);

    for op in (0xC5..=0xF5).step_by(0x10) {
        t.insert(op, "PUSH rr", 1, push);
    }
    for op in (0xC1..=0xF1).step_by(0x10) {
        t.insert(op, "POP rr", 1, pop);
    }
}

fn ld_r_r(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let dst = Operand::from_index(op >> 3);
    let src = Operand::from_index(op);
    let v = cpu.operand_get(mmu, src);
    cpu.operand_set(mmu, dst, v);
    if dst.is_memory() || src.is_memory() {
        2
    } else {
        1
    }
}

fn ld_r_n(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let dst = Operand::from_index(op >> 3);
    let v = cpu.imm8(mmu);
    cpu.operand_set(mmu, dst, v);
    if dst.is_memory() {
        3
    } else {
        2
    }
}

fn ld_bc_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    mmu.write8(cpu.register16_get(Register16::BC), cpu.a);
    2
}

fn ld_de_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    mmu.write8(cpu.register16_get(Register16::DE), cpu.a);
    2
}

fn ld_a_bc(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    cpu.a = mmu.read8(cpu.register16_get(Register16::BC));
    2
}

fn ld_a_de(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    cpu.a = mmu.read8(cpu.register16_get(Register16::DE));
    2
}

// HL is post-incremented/decremented after the access.
fn ldi_hl_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let hl = cpu.register16_get(Register16::HL);
    mmu.write8(hl, cpu.a);
    cpu.register16_set(Register16::HL, hl.wrapping_add(1));
    2
}

fn ldi_a_hl(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let hl = cpu.register16_get(Register16::HL);
    cpu.a = mmu.read8(hl);
    cpu.register16_set(Register16::HL, hl.wrapping_add(1));
    2
}

fn ldd_hl_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let hl = cpu.register16_get(Register16::HL);
    mmu.write8(hl, cpu.a);
    cpu.register16_set(Register16::HL, hl.wrapping_sub(1));
    2
}

fn ldd_a_hl(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let hl = cpu.register16_get(Register16::HL);
    cpu.a = mmu.read8(hl);
    cpu.register16_set(Register16::HL, hl.wrapping_sub(1));
    2
}

fn ldh_n_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = 0xFF00 | u16::from(cpu.imm8(mmu));
    mmu.write8(addr, cpu.a);
    3
}

fn ldh_a_n(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = 0xFF00 | u16::from(cpu.imm8(mmu));
    cpu.a = mmu.read8(addr);
    3
}

fn ld_c_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    mmu.write8(0xFF00 | u16::from(cpu.c), cpu.a);
    2
}

fn ld_a_c(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    cpu.a = mmu.read8(0xFF00 | u16::from(cpu.c));
    2
}

fn ld_nn_a(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.imm16(mmu);
    mmu.write8(addr, cpu.a);
    4
}

fn ld_a_nn(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.imm16(mmu);
    cpu.a = mmu.read8(addr);
    4
}

fn ld_rr_nn(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let v = cpu.imm16(mmu);
    cpu.register16_set(Register16::from_index(op >> 4, false), v);
    3
}

fn ld_nn_sp(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let addr = cpu.imm16(mmu);
    mmu.write16(addr, cpu.sp);
    5
}

fn ld_sp_hl(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    cpu.sp = cpu.register16_get(Register16::HL);
    2
}

fn ld_hl_sp_e(cpu: &mut Cpu, mmu: &mut Mmu, _: u8) -> u8 {
    let e = cpu.imm8(mmu);
    let v = sp_offset(cpu, e);
    cpu.register16_set(Register16::HL, v);
    3
}

/// SP plus a signed 8-bit offset, shared with ADD SP,e. Z and N are cleared, H and C come from the unsigned addition
/// of the low byte of SP and the offset.
pub(crate) fn sp_offset(cpu: &mut Cpu, e: u8) -> u16 {
    let sp = cpu.sp;
    let d = i16::from(e as i8) as u16;
    cpu.reset_flag(Flag::Z);
    cpu.reset_flag(Flag::N);
    cpu.update_flag(Flag::H, (sp & 0xF) + (d & 0xF) > 0xF);
    cpu.update_flag(Flag::C, (sp & 0xFF) + (d & 0xFF) > 0xFF);
    sp.wrapping_add(d)
}

fn push(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let v = cpu.register16_get(Register16::from_index(op >> 4, true));
    cpu.push16(mmu, v);
    4
}

fn pop(cpu: &mut Cpu, mmu: &mut Mmu, op: u8) -> u8 {
    let v = cpu.pop16(mmu);
    cpu.register16_set(Register16::from_index(op >> 4, true), v);
    3
}
