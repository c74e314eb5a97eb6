//! The handheld's CPU is an 8-bit Z80-like processor (the Sharp LR35902) with 8 8-bit registers, one of which holds the
//! ALU flags, and a 16-bit address bus. Pairs of the 8-bit registers can also be viewed as 16-bit registers.
//! Instructions are executed one at a time: fetch the opcode at PC, look it up in the dispatch table (see `table`),
//! run the handler, then advance PC past the instruction unless the handler moved it itself.
//! Handlers report how many machine cycles the instruction took, the caller forwards that to the GPU.

pub mod opcodes;
pub mod table;

use crate::error::CpuError;
use crate::mmu::Mmu;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

/// The register file plus the bits of CPU state instructions can change.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Cpu {
    pub a: u8,
    pub f: u8, // Flags live in the top nibble, the low nibble always reads as 0.
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub pc: u16,
    pub sp: u16,

    pub ime: bool,
    // Cleared by handlers that load PC themselves (jumps, calls, returns, restarts).
    pub increment_pc: bool,
}

/// The ALU flags held in the upper nibble of F. The discriminant is the flag's bit mask.
/// Z: zero, N: subtract, H: half carry (carry out of bit 3), C: carry (out of bit 7)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    Z = 0x80,
    N = 0x40,
    H = 0x20,
    C = 0x10,
}

/// The 7 directly addressable 8-bit registers. F is not included, instructions only ever touch it through the flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Register { A, B, C, D, E, H, L }

/// The 16-bit views. All but SP are pairs of 8-bit registers, high byte first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Register16 { AF, BC, DE, HL, SP }

/// The thing an 8-bit instruction reads or writes, as encoded in its opcode. Index 6 of the encoding isn't a register,
/// it is the byte in memory that HL points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(Register),
    IndirectHL,
}

impl Operand {
    /// Decodes the 3-bit register index used throughout the instruction set: B, C, D, E, H, L, (HL), A.
    pub fn from_index(idx: u8) -> Operand {
        match idx & 0b111 {
            0 => Operand::Reg(Register::B),
            1 => Operand::Reg(Register::C),
            2 => Operand::Reg(Register::D),
            3 => Operand::Reg(Register::E),
            4 => Operand::Reg(Register::H),
            5 => Operand::Reg(Register::L),
            6 => Operand::IndirectHL,
            _ => Operand::Reg(Register::A),
        }
    }

    pub fn is_memory(self) -> bool {
        self == Operand::IndirectHL
    }
}

impl Register16 {
    /// Decodes the 2-bit register pair index: BC, DE, HL, then SP (or AF for PUSH/POP).
    pub fn from_index(idx: u8, af: bool) -> Register16 {
        match idx & 0b11 {
            0 => Register16::BC,
            1 => Register16::DE,
            2 => Register16::HL,
            _ if af => Register16::AF,
            _ => Register16::SP,
        }
    }
}

/// The 4 conditions available to branching instructions (CALL/JP/JR/RET).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagCondition {
    NZ, // CPU flag Z is clear
    Z,  // CPU flag Z is set
    NC, // CPU flag C is clear
    C,  // CPU flag C is set
}

impl FlagCondition {
    /// Decodes the 2-bit condition encoded in bits 3-4 of conditional branches.
    pub fn from_index(idx: u8) -> FlagCondition {
        match idx & 0b11 {
            0 => FlagCondition::NZ,
            1 => FlagCondition::Z,
            2 => FlagCondition::NC,
            _ => FlagCondition::C,
        }
    }
}

impl Default for Cpu {
    fn default() -> Cpu {
        Cpu {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            pc: 0,
            sp: 0,
            ime: false,
            increment_pc: true,
        }
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Default::default()
    }

    /// Zeroes every register, including PC and SP.
    pub fn reset(&mut self) {
        *self = Default::default();
        debug!("CPU reset");
    }

    /// Executes a single instruction and returns the number of machine cycles it took.
    /// If the opcode at PC isn't implemented, nothing is changed and an error is returned.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<u8, CpuError> {
        let pc = self.pc;
        let mut key = u16::from(mmu.read8(pc));
        if key == 0xCB {
            key = 0xCB00 | u16::from(mmu.read8(pc.wrapping_add(1)));
        }

        let opcode = match table::lookup(key) {
            Some(opcode) => opcode,
            None => {
                warn!("Unimplemented opcode {:#06X} at {:#06X}", key, pc);
                return Err(CpuError::UnimplementedOpcode { opcode: key, pc });
            }
        };

        self.increment_pc = true;
        let cycles = (opcode.handler)(self, mmu, key as u8);
        trace!("{:#06X}: {:#06X} {} ({} cycles)", pc, key, opcode.mnemonic, cycles);

        if self.increment_pc {
            self.pc = self.pc.wrapping_add(u16::from(opcode.length));
        }
        self.increment_pc = true;

        Ok(cycles)
    }

    /// 1 if the flag is set, 0 otherwise. Handy for folding the carry into arithmetic.
    pub fn test_flag(&self, flag: Flag) -> u8 {
        if self.f & flag as u8 > 0 {
            1
        } else {
            0
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.test_flag(flag) == 1
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.f |= flag as u8;
    }

    pub fn reset_flag(&mut self, flag: Flag) {
        self.f &= !(flag as u8);
    }

    pub fn update_flag(&mut self, flag: Flag, set: bool) {
        if set {
            self.set_flag(flag);
        } else {
            self.reset_flag(flag);
        }
    }

    /// Sets all four flags at once.
    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.update_flag(Flag::Z, z);
        self.update_flag(Flag::N, n);
        self.update_flag(Flag::H, h);
        self.update_flag(Flag::C, c);
    }

    pub fn check_condition(&self, cond: FlagCondition) -> bool {
        match cond {
            FlagCondition::NZ => !self.flag(Flag::Z),
            FlagCondition::Z => self.flag(Flag::Z),
            FlagCondition::NC => !self.flag(Flag::C),
            FlagCondition::C => self.flag(Flag::C),
        }
    }

    pub fn register_get(&self, reg: Register) -> u8 {
        match reg {
            Register::A => self.a,
            Register::B => self.b,
            Register::C => self.c,
            Register::D => self.d,
            Register::E => self.e,
            Register::H => self.h,
            Register::L => self.l,
        }
    }

    pub fn register_set(&mut self, reg: Register, v: u8) {
        match reg {
            Register::A => self.a = v,
            Register::B => self.b = v,
            Register::C => self.c = v,
            Register::D => self.d = v,
            Register::E => self.e = v,
            Register::H => self.h = v,
            Register::L => self.l = v,
        }
    }

    pub fn register16_get(&self, reg: Register16) -> u16 {
        match reg {
            Register16::AF => (u16::from(self.a) << 8) | u16::from(self.f),
            Register16::BC => (u16::from(self.b) << 8) | u16::from(self.c),
            Register16::DE => (u16::from(self.d) << 8) | u16::from(self.e),
            Register16::HL => (u16::from(self.h) << 8) | u16::from(self.l),
            Register16::SP => self.sp,
        }
    }

    pub fn register16_set(&mut self, reg: Register16, v: u16) {
        let hi = (v >> 8) as u8;
        let lo = v as u8;
        match reg {
            Register16::AF => {
                self.a = hi;
                self.f = lo & 0xF0;
            }
            Register16::BC => {
                self.b = hi;
                self.c = lo;
            }
            Register16::DE => {
                self.d = hi;
                self.e = lo;
            }
            Register16::HL => {
                self.h = hi;
                self.l = lo;
            }
            Register16::SP => self.sp = v,
        }
    }

    pub fn operand_get(&self, mmu: &Mmu, o: Operand) -> u8 {
        match o {
            Operand::Reg(r) => self.register_get(r),
            Operand::IndirectHL => mmu.read8(self.register16_get(Register16::HL)),
        }
    }

    pub fn operand_set(&mut self, mmu: &mut Mmu, o: Operand, v: u8) {
        match o {
            Operand::Reg(r) => self.register_set(r, v),
            Operand::IndirectHL => mmu.write8(self.register16_get(Register16::HL), v),
        }
    }

    /// The byte following the opcode.
    pub fn imm8(&self, mmu: &Mmu) -> u8 {
        mmu.read8(self.pc.wrapping_add(1))
    }

    /// The little-endian word following the opcode.
    pub fn imm16(&self, mmu: &Mmu) -> u16 {
        mmu.read16(self.pc.wrapping_add(1))
    }

    pub fn push16(&mut self, mmu: &mut Mmu, v: u16) {
        self.sp = self.sp.wrapping_sub(2);
        mmu.write16(self.sp, v);
    }

    pub fn pop16(&mut self, mmu: &mut Mmu) -> u16 {
        let v = mmu.read16(self.sp);
        self.sp = self.sp.wrapping_add(2);
        v
    }

    /// Loads PC and stops the automatic advance past the current instruction.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
        self.increment_pc = false;
    }
}
