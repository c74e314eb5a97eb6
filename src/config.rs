/// Construction-time settings for a `Machine`.
#[derive(Clone, Debug)]
pub struct Config {
    /// How many instructions `Machine::run_frame` executes.
    pub steps_per_frame: usize,
    /// When false, `Machine::reset` jumps straight to the post-boot state instead of running the boot ROM.
    pub start_in_bios: bool,
    /// Boot ROM image, mapped at 0x0000 - 0x00FF while the boot ROM is enabled. Zero-filled if not provided.
    pub bios: Option<Vec<u8>>,
}

pub const DEFAULT_STEPS_PER_FRAME: usize = 60_000;

impl Default for Config {
    fn default() -> Config {
        Config {
            steps_per_frame: DEFAULT_STEPS_PER_FRAME,
            start_in_bios: true,
            bios: None,
        }
    }
}
