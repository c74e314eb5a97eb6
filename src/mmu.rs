//! The MMU owns everything hanging off the 16-bit address bus and decides which piece of hardware a given address
//! belongs to. Memory map:
//!
//!   0x0000 - 0x00FF  boot ROM, while it is still mapped. Cartridge ROM otherwise.
//!   0x0000 - 0x7FFF  cartridge ROM (32KB, no banking). Writes are dropped.
//!   0x8000 - 0x9FFF  VRAM (GPU)
//!   0xA000 - 0xBFFF  external (cartridge) RAM
//!   0xC000 - 0xDFFF  work RAM
//!   0xE000 - 0xFDFF  echo of work RAM
//!   0xFE00 - 0xFE9F  OAM (GPU)
//!   0xFF40 - 0xFF4B  GPU registers
//!   0xFF50           boot ROM disable
//!   0xFF80 - 0xFFFF  zero page RAM
//!
//! Anything else is unmapped: reads return 0xFF and writes go nowhere.

use crate::gpu::Gpu;
use crate::memory_segment;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const BIOS_SIZE: usize = 0x100;
pub const ROM_SIZE: usize = 0x8000;
pub const ERAM_SIZE: usize = 0x2000;
pub const WRAM_SIZE: usize = 0x2000;
pub const ZRAM_SIZE: usize = 0x80;

memory_segment! { Bios; BIOS_SIZE }
memory_segment! { Rom; ROM_SIZE }
memory_segment! { WorkRam; WRAM_SIZE }
memory_segment! { ZeroPage; ZRAM_SIZE }

#[derive(Deserialize, Serialize)]
pub struct Mmu {
    pub in_bios: bool,
    pub bios: Bios,
    pub rom: Rom,
    #[serde(with = "serde_bytes")]
    pub eram: Vec<u8>,
    pub wram: WorkRam,
    pub zram: ZeroPage,
    pub gpu: Gpu,
}

impl Default for Mmu {
    fn default() -> Mmu {
        Mmu {
            in_bios: true,
            bios: Default::default(),
            rom: Default::default(),
            eram: vec![0; ERAM_SIZE],
            wram: Default::default(),
            zram: Default::default(),
            gpu: Default::default(),
        }
    }
}

impl Mmu {
    pub fn new() -> Mmu {
        Default::default()
    }

    /// Clears all RAM, resets the GPU and maps the boot ROM back in. The loaded cartridge and boot ROM images stay.
    pub fn reset(&mut self) {
        self.in_bios = true;
        self.eram.clear();
        self.eram.resize(ERAM_SIZE, 0);
        for b in self.wram.iter_mut() {
            *b = 0;
        }
        for b in self.zram.iter_mut() {
            *b = 0;
        }
        self.gpu.reset();
    }

    /// Copies a cartridge image into ROM. Anything past 32KB is dropped, anything short of it is zero-filled.
    pub fn load(&mut self, rom: &[u8]) {
        let len = rom.len().min(ROM_SIZE);
        if rom.len() > ROM_SIZE {
            warn!("ROM image is {} bytes, truncating to {}", rom.len(), ROM_SIZE);
        }
        self.rom[..len].copy_from_slice(&rom[..len]);
        for b in self.rom[len..].iter_mut() {
            *b = 0;
        }
        debug!("Loaded {} bytes of ROM", len);
    }

    /// Installs a boot ROM image. Same truncate/pad rules as `load`.
    pub fn load_bios(&mut self, bios: &[u8]) {
        let len = bios.len().min(BIOS_SIZE);
        if bios.len() > BIOS_SIZE {
            warn!("Boot ROM image is {} bytes, truncating to {}", bios.len(), BIOS_SIZE);
        }
        self.bios[..len].copy_from_slice(&bios[..len]);
        for b in self.bios[len..].iter_mut() {
            *b = 0;
        }
    }

    /// Battery-backed cartridge RAM, for hosts that want to persist it.
    pub fn external_ram(&self) -> &[u8] {
        &self.eram
    }

    pub fn read8(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x00FF if self.in_bios => self.bios[addr as usize],
            0x0000..=0x7FFF => self.rom[addr as usize],
            0x8000..=0x9FFF => self.gpu.vram_read(addr - 0x8000),
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.gpu.oam_read(addr - 0xFE00),
            0xFF40..=0xFF4B => self.gpu.reg_read(addr),
            0xFF80..=0xFFFF => self.zram[(addr - 0xFF80) as usize],
            _ => 0xFF,
        }
    }

    pub fn write8(&mut self, addr: u16, v: u8) {
        match addr {
            0x0000..=0x7FFF => {} // No MBC, so ROM writes have nowhere to go.
            0x8000..=0x9FFF => self.gpu.vram_write(addr - 0x8000, v),
            0xA000..=0xBFFF => self.eram[(addr - 0xA000) as usize] = v,
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = v,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = v,
            0xFE00..=0xFE9F => self.gpu.oam_write(addr - 0xFE00, v),
            0xFF46 => self.oam_dma(v),
            0xFF40..=0xFF4B => self.gpu.reg_write(addr, v),
            0xFF50 => {
                if v != 0 && self.in_bios {
                    self.in_bios = false;
                    debug!("Boot ROM unmapped");
                }
            }
            0xFF80..=0xFFFF => self.zram[(addr - 0xFF80) as usize] = v,
            _ => {}
        }
    }

    /// Little-endian: low byte at addr, high byte at addr + 1.
    pub fn read16(&self, addr: u16) -> u16 {
        u16::from(self.read8(addr)) | (u16::from(self.read8(addr.wrapping_add(1))) << 8)
    }

    pub fn write16(&mut self, addr: u16, v: u16) {
        self.write8(addr, v as u8);
        self.write8(addr.wrapping_add(1), (v >> 8) as u8);
    }

    // Copies 160 bytes from page v into OAM. Real hardware takes 160 machine cycles and locks the bus meanwhile, here
    // it is instantaneous.
    fn oam_dma(&mut self, v: u8) {
        self.gpu.reg_write(0xFF46, v);
        let src = u16::from(v) << 8;
        for i in 0..0xA0 {
            let b = self.read8(src.wrapping_add(i));
            self.gpu.oam_write(i, b);
        }
    }
}
