#![allow(dead_code)]

use dmgcore::{Machine, Step};

/// A machine with the boot ROM unmapped and the given program at the start of cartridge ROM. PC is 0.
pub fn machine_with(program: &[u8]) -> Machine {
    let mut rom = vec![0; 0x8000];
    rom[..program.len()].copy_from_slice(program);

    let mut machine = Machine::default();
    machine.load(&rom);
    machine.mmu.in_bios = false;
    machine
}

/// Steps once, panicking on an unimplemented opcode.
pub fn step(machine: &mut Machine) -> Step {
    machine.step().unwrap()
}

/// Steps n times and returns the total machine cycles taken.
pub fn run(machine: &mut Machine, n: usize) -> u32 {
    (0..n).map(|_| u32::from(step(machine).cycles)).sum()
}

/// Raw RGBA of a framebuffer pixel.
pub fn pixel(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
    let offset = (y * 160 + x) * 4;
    [frame[offset], frame[offset + 1], frame[offset + 2], frame[offset + 3]]
}

pub const WHITE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
pub const LIGHT: [u8; 4] = [170, 170, 170, 0xFF];
pub const DARK: [u8; 4] = [85, 85, 85, 0xFF];
pub const BLACK: [u8; 4] = [0, 0, 0, 0xFF];
