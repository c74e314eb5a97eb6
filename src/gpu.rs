//! The GPU (or PPU, depending on who you ask) turns tile data and a handful of registers into a 160x144 picture.
//! It walks through a fixed cycle of modes for every scanline: an OAM scan, a VRAM scan (at the end of which we
//! rasterize the whole line in one go), then HBlank. After the last visible line it sits in VBlank for the remainder
//! of the frame before starting over at line 0.
//! Timing here is line-granular. Nothing happens mid-line, so raster effects that change registers during a VRAM scan
//! will only be picked up on the next line.

use crate::memory_segment;
use crate::util::{tile_data_offset, tile_map_offset, tile_number, TILE_BYTES, TILE_COUNT};
use log::trace;
use serde::{Deserialize, Serialize};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const FRAMEBUFFER_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 4;

// Mode timer thresholds, in master clock ticks.
pub const OAM_SCAN_TICKS: u32 = 80;
pub const VRAM_SCAN_TICKS: u32 = 172;
pub const HBLANK_TICKS: u32 = 204;
pub const VBLANK_LINE_TICKS: u32 = 456;

/// Reaching this line from an HBlank switches to VBlank.
pub const VBLANK_START_LINE: u8 = 143;
pub const LAST_LINE: u8 = 153;

const MAX_SPRITES_PER_LINE: usize = 10;
const TILE_PIXELS: usize = 64;

memory_segment! { Vram; 0x2000 }
memory_segment! { Oam; 0xA0 }
memory_segment! { TileCache; TILE_COUNT * TILE_PIXELS }
memory_segment! { Framebuffer; FRAMEBUFFER_SIZE }

/// The four phases the GPU cycles through. The discriminant is what shows up in the low 2 bits of STAT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    VramScan = 3,
}

impl From<u8> for Mode {
    fn from(v: u8) -> Mode {
        match v & 0b11 {
            0 => Mode::HBlank,
            1 => Mode::VBlank,
            2 => Mode::OamScan,
            _ => Mode::VramScan,
        }
    }
}

#[derive(Deserialize, Serialize)]
pub struct Gpu {
    pub vram: Vram, // 0x8000 - 0x9FFF
    pub oam: Oam,   // 0xFE00 - 0xFE9F
    // Decoded 2-bit colour numbers for every tile, 64 per tile in row-major order. Derived entirely from VRAM, so it
    // isn't persisted. See rebuild_tile_cache.
    #[serde(skip)]
    tiles: TileCache,
    pub framebuffer: Framebuffer,

    pub lcdc: u8, // 0xFF40 LCDC register
    pub stat: u8, // 0xFF41 STAT register, low 2 bits are the current mode
    pub scy: u8,  // 0xFF42 SCY register
    pub scx: u8,  // 0xFF43 SCX register
    pub ly: u8,   // 0xFF44 LY register
    pub lyc: u8,  // 0xFF45 LYC register
    pub dma: u8,  // 0xFF46 last OAM DMA source page
    pub bgp: u8,  // 0xFF47 BGP register
    pub obp0: u8, // 0xFF48 OBP0 register
    pub obp1: u8, // 0xFF49 OBP1 register
    pub wy: u8,   // 0xFF4A WY register
    pub wx: u8,   // 0xFF4B WX register

    pub mode_clock: u32,
    window_line: u8,
}

impl Default for Gpu {
    fn default() -> Gpu {
        let mut gpu = Gpu {
            vram: Default::default(),
            oam: Default::default(),
            tiles: Default::default(),
            framebuffer: Default::default(),
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            mode_clock: 0,
            window_line: 0,
        };
        gpu.reset();
        gpu
    }
}

impl Gpu {
    pub fn new() -> Gpu {
        Default::default()
    }

    /// Clears video memory and returns every register to its power-on value. The framebuffer goes back to white.
    pub fn reset(&mut self) {
        for b in self.vram.iter_mut() {
            *b = 0;
        }
        for b in self.oam.iter_mut() {
            *b = 0;
        }
        for b in self.tiles.iter_mut() {
            *b = 0;
        }
        for b in self.framebuffer.iter_mut() {
            *b = 0xFF;
        }

        self.lcdc = 0;
        self.stat = 0;
        self.scy = 0;
        self.scx = 0;
        self.ly = 0;
        self.lyc = 0;
        self.dma = 0;
        self.bgp = 0;
        self.obp0 = 0;
        self.obp1 = 0;
        self.wy = 0;
        self.wx = 0;
        self.mode_clock = 0;
        self.window_line = 0;
        self.set_mode(Mode::OamScan);
        self.update_coincidence();
    }

    /// Advances the mode timer by the given number of clock ticks. Returns true if this call completed a frame (i.e we
    /// just entered VBlank).
    pub fn execute(&mut self, ticks: u32) -> bool {
        // Every rollover zeroes the clock, so clamping at the top is harmless.
        self.mode_clock = self.mode_clock.saturating_add(ticks);
        let mut frame_complete = false;

        match self.mode() {
            Mode::OamScan => {
                if self.mode_clock >= OAM_SCAN_TICKS {
                    self.mode_clock = 0;
                    self.set_mode(Mode::VramScan);
                }
            }
            Mode::VramScan => {
                if self.mode_clock >= VRAM_SCAN_TICKS {
                    self.mode_clock = 0;
                    self.set_mode(Mode::HBlank);
                    self.render_scan();
                }
            }
            Mode::HBlank => {
                if self.mode_clock >= HBLANK_TICKS {
                    self.mode_clock = 0;
                    self.set_ly(self.ly.wrapping_add(1));

                    if self.ly == VBLANK_START_LINE {
                        self.set_mode(Mode::VBlank);
                        frame_complete = true;
                        trace!("GPU entered VBlank, frame complete");
                    } else {
                        self.set_mode(Mode::OamScan);
                    }
                }
            }
            Mode::VBlank => {
                if self.mode_clock >= VBLANK_LINE_TICKS {
                    self.mode_clock = 0;
                    let next = self.ly.wrapping_add(1);

                    if next > LAST_LINE {
                        self.set_ly(0);
                        self.window_line = 0;
                        self.set_mode(Mode::OamScan);
                    } else {
                        self.set_ly(next);
                    }
                }
            }
        }

        frame_complete
    }

    /// Checks that restored register state is one `execute` could have produced: LY within the frame and the mode
    /// timer short of its rollover point.
    pub(crate) fn check_state(&self) -> Result<(), &'static str> {
        if self.ly > LAST_LINE {
            return Err("LY out of range");
        }
        let limit = match self.mode() {
            Mode::OamScan => OAM_SCAN_TICKS,
            Mode::VramScan => VRAM_SCAN_TICKS,
            Mode::HBlank => HBLANK_TICKS,
            Mode::VBlank => VBLANK_LINE_TICKS,
        };
        if self.mode_clock >= limit {
            return Err("GPU mode clock past rollover");
        }
        Ok(())
    }

    /// Current mode, from the low 2 bits of STAT.
    pub fn mode(&self) -> Mode {
        Mode::from(self.stat & 0b11)
    }

    /// Sets the mode bits of STAT, leaving the rest of the register alone.
    pub fn set_mode(&mut self, mode: Mode) {
        self.stat = (self.stat & !0b11) | mode as u8;
    }

    fn set_ly(&mut self, ly: u8) {
        self.ly = ly;
        self.update_coincidence();
    }

    // STAT bit 2 tracks whether LY == LYC.
    fn update_coincidence(&mut self) {
        if self.ly == self.lyc {
            self.stat |= 0b0000_0100;
        } else {
            self.stat &= !0b0000_0100;
        }
    }

    /// LCDC bit 7
    pub fn lcd_enabled(&self) -> bool {
        (self.lcdc >> 7) & 1 == 1
    }

    /// LCDC bit 6: window uses the tile map at 0x9C00 instead of 0x9800.
    pub fn window_tile_map_hi(&self) -> bool {
        (self.lcdc >> 6) & 1 == 1
    }

    /// LCDC bit 5
    pub fn window_enabled(&self) -> bool {
        (self.lcdc >> 5) & 1 == 1
    }

    /// LCDC bit 4: background/window tile data is addressed unsigned from 0x8000 instead of signed from 0x9000.
    pub fn tile_data_unsigned(&self) -> bool {
        (self.lcdc >> 4) & 1 == 1
    }

    /// LCDC bit 3: background uses the tile map at 0x9C00 instead of 0x9800.
    pub fn bg_tile_map_hi(&self) -> bool {
        (self.lcdc >> 3) & 1 == 1
    }

    /// LCDC bit 2: sprites are 8x16 instead of 8x8.
    pub fn obj_tall(&self) -> bool {
        (self.lcdc >> 2) & 1 == 1
    }

    /// LCDC bit 1
    pub fn obj_enabled(&self) -> bool {
        (self.lcdc >> 1) & 1 == 1
    }

    /// LCDC bit 0
    pub fn bg_enabled(&self) -> bool {
        self.lcdc & 1 == 1
    }

    pub fn vram_read(&self, addr: u16) -> u8 {
        self.vram[usize::from(addr & 0x1FFF)]
    }

    pub fn vram_write(&mut self, addr: u16, v: u8) {
        let addr = usize::from(addr & 0x1FFF);
        self.vram[addr] = v;

        // Tile data needs to be re-decoded. The tile maps above 0x1800 are read directly when rendering.
        if addr < TILE_COUNT * TILE_BYTES {
            self.update_tile_row(addr);
        }
    }

    pub fn oam_read(&self, addr: u16) -> u8 {
        self.oam.get(usize::from(addr)).copied().unwrap_or(0xFF)
    }

    pub fn oam_write(&mut self, addr: u16, v: u8) {
        if let Some(b) = self.oam.get_mut(usize::from(addr)) {
            *b = v;
        }
    }

    /// Handles reads of the 0xFF40 - 0xFF4B register block.
    pub fn reg_read(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => self.stat,
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    /// Handles writes to the 0xFF40 - 0xFF4B register block. 0xFF46 (DMA) is driven by the MMU since it needs to read
    /// the source data, this only records the page.
    pub fn reg_write(&mut self, addr: u16, v: u8) {
        match addr {
            0xFF40 => self.lcdc = v,
            // The mode and coincidence bits are read-only.
            0xFF41 => self.stat = (v & 0b0111_1000) | (self.stat & 0b0000_0111),
            0xFF42 => self.scy = v,
            0xFF43 => self.scx = v,
            0xFF44 => {} // LY is read-only.
            0xFF45 => {
                self.lyc = v;
                self.update_coincidence();
            }
            0xFF46 => self.dma = v,
            0xFF47 => self.bgp = v,
            0xFF48 => self.obp0 = v,
            0xFF49 => self.obp1 = v,
            0xFF4A => self.wy = v,
            0xFF4B => self.wx = v,
            _ => {}
        }
    }

    /// Re-decodes the whole tile cache from VRAM. Needed after VRAM has been replaced wholesale (loading a state).
    pub fn rebuild_tile_cache(&mut self) {
        for row in (0..TILE_COUNT * TILE_BYTES).step_by(2) {
            self.update_tile_row(row);
        }
    }

    // Decodes the row of the tile that the given VRAM byte belongs to. Each row is a pair of bytes: the first holds
    // the low bit of each pixel's colour number, the second the high bit. Leftmost pixel is bit 7.
    fn update_tile_row(&mut self, addr: usize) {
        let base = addr & !1;
        let lo = self.vram[base];
        let hi = self.vram[base + 1];
        let tile = base / TILE_BYTES;
        let row = (base % TILE_BYTES) / 2;

        let dst = tile * TILE_PIXELS + row * 8;
        for x in 0..8 {
            let bit = 7 - x;
            self.tiles[dst + x] = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
        }
    }

    /// Raw 16-byte bitmap of the tile a map entry refers to, honouring the current addressing mode (LCDC bit 4).
    pub fn tile_data(&self, index: u8) -> &[u8] {
        let offset = tile_data_offset(index, self.tile_data_unsigned());
        &self.vram[offset..offset + TILE_BYTES]
    }

    /// Colour number (0 - 3) of a pixel in a decoded tile.
    pub fn tile_pixel(&self, tile: usize, x: usize, y: usize) -> u8 {
        self.tiles[tile * TILE_PIXELS + y * 8 + x]
    }

    // Looks up the colour number at (x, y) of the 256x256 plane described by the tile map at map_base.
    fn map_pixel(&self, map_base: usize, x: u8, y: u8) -> u8 {
        let index = self.vram[map_base + tile_map_offset(x, y)];
        let tile = tile_number(index, self.tile_data_unsigned());
        self.tile_pixel(tile, usize::from(x & 7), usize::from(y & 7))
    }

    /// Rasterizes the current line (LY) into the framebuffer: background, then window, then sprites.
    pub fn render_scan(&mut self) {
        let line = usize::from(self.ly);
        if line >= SCREEN_HEIGHT {
            return;
        }

        // Raw colour numbers are kept alongside the palette-mapped shades, sprite priority is decided on the former.
        let mut colors = [0u8; SCREEN_WIDTH];
        let mut shades = [0u8; SCREEN_WIDTH];

        if self.bg_enabled() {
            let map_base = if self.bg_tile_map_hi() { 0x1C00 } else { 0x1800 };
            let y = self.scy.wrapping_add(self.ly);
            for px in 0..SCREEN_WIDTH {
                let x = self.scx.wrapping_add(px as u8);
                let color = self.map_pixel(map_base, x, y);
                colors[px] = color;
                shades[px] = palette_shade(self.bgp, color);
            }
        }

        self.render_window(&mut colors, &mut shades);

        if self.obj_enabled() {
            self.render_sprites(&colors, &mut shades);
        }

        let base = line * SCREEN_WIDTH * 4;
        for (px, shade) in shades.iter().enumerate() {
            let intensity = 255 - shade * 85;
            let offset = base + px * 4;
            self.framebuffer[offset] = intensity;
            self.framebuffer[offset + 1] = intensity;
            self.framebuffer[offset + 2] = intensity;
            self.framebuffer[offset + 3] = 0xFF;
        }
    }

    // The window is an opaque second background layer anchored at (WX-7, WY). It has its own line counter so that
    // toggling it off for some lines resumes drawing where it left off.
    fn render_window(&mut self, colors: &mut [u8; SCREEN_WIDTH], shades: &mut [u8; SCREEN_WIDTH]) {
        if !self.window_enabled() || self.ly < self.wy || self.wx > 166 {
            return;
        }

        let map_base = if self.window_tile_map_hi() { 0x1C00 } else { 0x1800 };
        let left = isize::from(self.wx) - 7;
        let y = self.window_line;

        for px in left.max(0) as usize..SCREEN_WIDTH {
            let x = (px as isize - left) as u8;
            let color = self.map_pixel(map_base, x, y);
            colors[px] = color;
            shades[px] = palette_shade(self.bgp, color);
        }

        self.window_line = self.window_line.wrapping_add(1);
    }

    fn render_sprites(&self, colors: &[u8; SCREEN_WIDTH], shades: &mut [u8; SCREEN_WIDTH]) {
        let height: isize = if self.obj_tall() { 16 } else { 8 };
        let ly = isize::from(self.ly);

        // Collect the first 10 sprites in OAM order that overlap this line.
        let mut visible = [(0u8, 0usize); MAX_SPRITES_PER_LINE];
        let mut count = 0;
        for idx in 0..40 {
            let top = isize::from(self.oam[idx * 4]) - 16;
            if ly >= top && ly < top + height {
                visible[count] = (self.oam[idx * 4 + 1], idx);
                count += 1;
                if count == MAX_SPRITES_PER_LINE {
                    break;
                }
            }
        }

        // Lower X wins, ties go to the earlier OAM entry. The first sprite to claim a pixel owns it.
        let visible = &mut visible[..count];
        visible.sort_unstable();
        let mut claimed = [false; SCREEN_WIDTH];

        for &(x, idx) in visible.iter() {
            let sprite = SpriteAttrs::read(&self.oam[idx * 4..idx * 4 + 4]);
            let palette = if sprite.palette_hi() { self.obp1 } else { self.obp0 };

            let mut row = ly - (isize::from(sprite.y) - 16);
            if sprite.y_flip() {
                row = height - 1 - row;
            }
            let mut tile = usize::from(if height == 16 { sprite.tile & 0xFE } else { sprite.tile });
            if row >= 8 {
                tile += 1;
                row -= 8;
            }

            for i in 0..8 {
                let px = isize::from(x) - 8 + i;
                if px < 0 || px >= SCREEN_WIDTH as isize {
                    continue;
                }
                let px = px as usize;

                let col = (if sprite.x_flip() { 7 - i } else { i }) as usize;
                let color = self.tile_pixel(tile, col, row as usize);
                if color == 0 || claimed[px] {
                    continue;
                }
                claimed[px] = true;

                if sprite.behind_bg() && colors[px] != 0 {
                    continue;
                }
                shades[px] = palette_shade(palette, color);
            }
        }
    }
}

/// Maps a colour number through a DMG palette register (2 bits per colour number) to a shade 0 (white) - 3 (black).
pub fn palette_shade(palette: u8, color: u8) -> u8 {
    (palette >> (color * 2)) & 0b11
}

#[derive(Clone, Copy, Debug)]
struct SpriteAttrs {
    y: u8,
    tile: u8,
    attrs: u8,
}

impl SpriteAttrs {
    fn read(entry: &[u8]) -> SpriteAttrs {
        SpriteAttrs {
            y: entry[0],
            tile: entry[2],
            attrs: entry[3],
        }
    }

    fn behind_bg(self) -> bool {
        self.attrs & 0x80 > 0
    }
    fn y_flip(self) -> bool {
        self.attrs & 0x40 > 0
    }
    fn x_flip(self) -> bool {
        self.attrs & 0x20 > 0
    }
    fn palette_hi(self) -> bool {
        self.attrs & 0x10 > 0
    }
}
