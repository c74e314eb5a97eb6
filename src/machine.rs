//! `Machine` ties the CPU and the MMU (and through it, the GPU) together and is what a host drives. Every step runs one
//! instruction, then hands the elapsed time to the GPU.
//!
//! Save states are a small header (magic + format version) followed by the bincode encoding of the CPU and MMU.

use crate::config::Config;
use crate::cpu::{Cpu, Register16};
use crate::error::{CpuError, StateError};
use crate::mmu::{Mmu, ERAM_SIZE};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// The GPU mode timer counts master clock ticks, the CPU reports machine cycles. One machine cycle is 4 ticks.
pub const TICKS_PER_MACHINE_CYCLE: u32 = 4;

pub const STATE_MAGIC: &[u8; 4] = b"DMGS";
pub const STATE_VERSION: u32 = 1;

/// What a single `Machine::step` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub cycles: u8,
    /// The GPU entered VBlank during this step, the framebuffer holds a complete picture.
    pub frame_complete: bool,
}

pub struct Machine {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub config: Config,
    pub cycle_count: u64,
    pub frame_count: u64,
}

#[derive(Serialize)]
struct StateRef<'a> {
    cpu: &'a Cpu,
    mmu: &'a Mmu,
    cycle_count: u64,
    frame_count: u64,
}

#[derive(Deserialize)]
struct State {
    cpu: Cpu,
    mmu: Mmu,
    cycle_count: u64,
    frame_count: u64,
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new(Default::default())
    }
}

impl Machine {
    pub fn new(config: Config) -> Machine {
        let mut machine = Machine {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
            config,
            cycle_count: 0,
            frame_count: 0,
        };
        if let Some(bios) = machine.config.bios.as_ref() {
            machine.mmu.load_bios(bios);
        }
        machine.reset();
        machine
    }

    /// Powers the machine off and on again. Loaded ROM and boot ROM images survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.mmu.reset();
        self.cycle_count = 0;
        self.frame_count = 0;
        if !self.config.start_in_bios {
            self.skip_bios();
        }
        debug!("Machine reset");
    }

    pub fn load(&mut self, rom: &[u8]) {
        self.mmu.load(rom);
    }

    /// Puts everything in the state the boot ROM leaves it in when it hands over to the cartridge at 0x100.
    pub fn skip_bios(&mut self) {
        self.cpu.pc = 0x100;
        self.cpu.sp = 0xFFFE;
        self.cpu.register16_set(Register16::AF, 0x01B0);
        self.cpu.register16_set(Register16::BC, 0x0013);
        self.cpu.register16_set(Register16::DE, 0x00D8);
        self.cpu.register16_set(Register16::HL, 0x014D);
        self.mmu.gpu.lcdc = 0x91;
        self.mmu.gpu.bgp = 0xFC;
        self.mmu.in_bios = false;
    }

    /// Runs one instruction and advances the GPU by however long it took.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        let cycles = self.cpu.step(&mut self.mmu)?;
        let frame_complete = self.mmu.gpu.execute(u32::from(cycles) * TICKS_PER_MACHINE_CYCLE);

        self.cycle_count += u64::from(cycles);
        if frame_complete {
            self.frame_count += 1;
            trace!("Frame {} complete", self.frame_count);
        }

        Ok(Step {
            cycles,
            frame_complete,
        })
    }

    /// Runs the configured number of steps, stopping early if an instruction fails.
    pub fn run_frame(&mut self) -> Result<(), CpuError> {
        for _ in 0..self.config.steps_per_frame {
            self.step()?;
        }
        Ok(())
    }

    /// 160x144 RGBA pixels, row-major.
    pub fn frame(&self) -> &[u8] {
        &self.mmu.gpu.framebuffer
    }

    pub fn save_state<W: Write>(&self, mut w: W) -> Result<(), StateError> {
        w.write_all(STATE_MAGIC)?;
        w.write_u32::<LittleEndian>(STATE_VERSION)?;
        bincode::serialize_into(
            &mut w,
            &StateRef {
                cpu: &self.cpu,
                mmu: &self.mmu,
                cycle_count: self.cycle_count,
                frame_count: self.frame_count,
            },
        )?;
        debug!("Saved state at cycle {}", self.cycle_count);
        Ok(())
    }

    /// Replaces the whole machine state with a previously saved one. If anything is wrong with the input the current
    /// state is left alone.
    pub fn load_state<R: Read>(&mut self, mut r: R) -> Result<(), StateError> {
        let mut magic = [0; 4];
        r.read_exact(&mut magic)?;
        if &magic != STATE_MAGIC {
            return Err(StateError::BadMagic);
        }
        let version = r.read_u32::<LittleEndian>()?;
        if version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(version));
        }

        let mut state: State = bincode::deserialize_from(r)?;
        if state.mmu.eram.len() != ERAM_SIZE {
            return Err(StateError::Corrupt("external RAM size"));
        }
        state.mmu.gpu.check_state().map_err(StateError::Corrupt)?;
        state.cpu.f &= 0xF0;
        state.mmu.gpu.rebuild_tile_cache();

        self.cpu = state.cpu;
        self.mmu = state.mmu;
        self.cycle_count = state.cycle_count;
        self.frame_count = state.frame_count;
        debug!("Loaded state at cycle {}", self.cycle_count);
        Ok(())
    }
}
