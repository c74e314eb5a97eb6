//! A cycle-counted core for the monochrome 8-bit handheld: CPU, memory map and GPU. Hosts create a `Machine`, load
//! a cartridge image into it, step it and read the framebuffer back out.

pub mod config;
pub mod cpu;
pub mod error;
pub mod gpu;
pub mod machine;
pub mod mmu;
pub mod util;

pub use crate::config::Config;
pub use crate::cpu::{Cpu, Flag, Register, Register16};
pub use crate::error::{CpuError, StateError};
pub use crate::gpu::{Gpu, Mode, FRAMEBUFFER_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use crate::machine::{Machine, Step};
pub use crate::mmu::Mmu;
