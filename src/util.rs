//! Small address-mapping helpers shared by the GPU, plus the `memory_segment!` macro used to declare the fixed-size
//! memory regions that make up the machine.

/// Number of tiles addressable in VRAM tile data (0x8000 - 0x97FF).
pub const TILE_COUNT: usize = 384;
/// Each tile is 8x8 pixels at 2 bits per pixel, stored as 8 pairs of bytes.
pub const TILE_BYTES: usize = 16;

/// Resolves a tile index read from a tile map into an absolute tile number (0 - 383).
/// With the unsigned addressing mode (LCDC bit 4 set) the index is used as-is, tiles 0 - 255 starting at 0x8000.
/// With the signed addressing mode the index is a two's-complement offset from tile 256 (0x9000), so indices 0 - 127
/// land on tiles 256 - 383 and indices 128 - 255 on tiles 128 - 255.
pub fn tile_number(index: u8, unsigned_mode: bool) -> usize {
    if unsigned_mode {
        usize::from(index)
    } else {
        (256 + i16::from(index as i8)) as usize
    }
}

/// Byte offset of a tile's bitmap, relative to the start of VRAM.
pub fn tile_data_offset(index: u8, unsigned_mode: bool) -> usize {
    tile_number(index, unsigned_mode) * TILE_BYTES
}

/// Offset into a 32x32 tile map of the tile covering background pixel (x, y).
pub fn tile_map_offset(x: u8, y: u8) -> usize {
    (usize::from(y >> 3) << 5) + usize::from(x >> 3)
}

// Fixed-size memory regions are wrapped in newtypes so serde encodes them as a single byte blob. Going through the
// element-by-element "Seq" path is enormously slower for save states. The wrappers index/deref like a plain slice so
// the rest of the code doesn't have to care.
#[macro_export]
macro_rules! memory_segment {
    ( $name:ident; $size:expr ) => {
        // Heap backed, some of these are far too big to be moving around on the stack. The length never changes.
        #[derive(Clone)]
        pub struct $name(Box<[u8]>);

        impl Default for $name {
            fn default() -> $name {
                $name(vec![0; $size].into_boxed_slice())
            }
        }

        impl std::ops::Deref for $name {
            type Target = [u8];

            fn deref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut [u8] {
                &mut self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct SegmentVisitor;

                impl<'de> serde::de::Visitor<'de> for SegmentVisitor {
                    type Value = $name;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        write!(formatter, "a byte array of {} elements", $size)
                    }

                    fn visit_bytes<E>(self, value: &[u8]) -> Result<$name, E>
                    where
                        E: serde::de::Error,
                    {
                        if value.len() != $size {
                            return Err(E::invalid_length(value.len(), &self));
                        }
                        Ok($name(value.to_vec().into_boxed_slice()))
                    }
                }

                deserializer.deserialize_bytes(SegmentVisitor)
            }
        }
    };
}
