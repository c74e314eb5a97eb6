//! The dispatch table. Opcodes are keyed by a u16: plain opcodes are 0x00 - 0xFF, the 0xCB-prefixed extended set is
//! 0xCB00 - 0xCBFF. The table is built once, the first time anything is looked up.

use super::opcodes::{alu, bits, jump, load, misc, rotate};
use super::Cpu;
use crate::mmu::Mmu;
use lazy_static::lazy_static;

/// Instruction implementation. Receives the low byte of the opcode so that one handler can serve a whole family of
/// opcodes that only differ in the register/bit/condition encoded in it. Returns machine cycles taken.
pub type Handler = fn(&mut Cpu, &mut Mmu, u8) -> u8;

#[derive(Clone, Copy)]
pub struct Opcode {
    /// Mnemonic family, e.g "LD r,r'" or "BIT b,r".
    pub mnemonic: &'static str,
    /// Encoded length in bytes, including the 0xCB prefix. PC advances by this much after the handler runs.
    pub length: u8,
    pub handler: Handler,
}

pub struct OpcodeTable {
    base: Vec<Option<Opcode>>,
    extended: Vec<Option<Opcode>>,
}

lazy_static! {
    static ref TABLE: OpcodeTable = OpcodeTable::build();
}

/// Finds the entry for an opcode key. None for the handful of opcodes that don't exist on this CPU.
pub fn lookup(key: u16) -> Option<&'static Opcode> {
    TABLE.get(key)
}

impl OpcodeTable {
    fn build() -> OpcodeTable {
        let mut table = OpcodeTable {
            base: vec![None; 0x100],
            extended: vec![None; 0x100],
        };
        load::register(&mut table);
        alu::register(&mut table);
        rotate::register(&mut table);
        bits::register(&mut table);
        jump::register(&mut table);
        misc::register(&mut table);
        table
    }

    fn slot(&mut self, key: u16) -> Option<&mut Option<Opcode>> {
        match key {
            0x0000..=0x00FF => self.base.get_mut(key as usize),
            0xCB00..=0xCBFF => self.extended.get_mut((key & 0xFF) as usize),
            _ => None,
        }
    }

    pub fn get(&self, key: u16) -> Option<&Opcode> {
        match key {
            0x0000..=0x00FF => self.base[key as usize].as_ref(),
            0xCB00..=0xCBFF => self.extended[(key & 0xFF) as usize].as_ref(),
            _ => None,
        }
    }

    /// Registers a handler. Each key is claimed by exactly one instruction family.
    pub fn insert(&mut self, key: u16, mnemonic: &'static str, length: u8, handler: Handler) {
        if let Some(slot) = self.slot(key) {
            debug_assert!(slot.is_none(), "opcode {:#06X} registered twice", key);
            *slot = Some(Opcode {
                mnemonic,
                length,
                handler,
            });
        }
    }

    /// Number of populated entries across both tables.
    pub(crate) fn len(&self) -> usize {
        self.base.iter().chain(self.extended.iter()).filter(|o| o.is_some()).count()
    }
}

/// Number of implemented opcodes, base and extended.
pub fn implemented() -> usize {
    TABLE.len()
}
