//! Control instructions and the carry flag twiddlers.
//! There are no interrupts or low-power modes in this core, so HALT and STOP just burn their cycles and move on.

use crate::cpu::table::OpcodeTable;
use crate::cpu::{Cpu, Flag};
use crate::mmu::Mmu;

pub(crate) fn register(t: &mut OpcodeTable) {
    t.insert(0x00, "NOP", 1, nop);
    t.insert(0x76, "HALT", 1, nop);
    // STOP is encoded with a trailing 0x00.
    t.insert(0x10, "STOP", 2, nop);
    t.insert(0xF3, "DI", 1, di);
    t.insert(0xFB, "EI", 1, ei);
    t.insert(0x37, "SCF", 1, scf);
    t.insert(0x3F, "CCF", 1, ccf);
}

fn nop(_: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    1
}

fn di(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    cpu.ime = false;
    1
}

fn ei(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    cpu.ime = true;
    1
}

fn scf(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    cpu.reset_flag(Flag::N);
    cpu.reset_flag(Flag::H);
    cpu.set_flag(Flag::C);
    1
}

fn ccf(cpu: &mut Cpu, _: &mut Mmu, _: u8) -> u8 {
    let c = cpu.flag(Flag::C);
    cpu.reset_flag(Flag::N);
    cpu.reset_flag(Flag::H);
    cpu.update_flag(Flag::C, !c);
    1
}
