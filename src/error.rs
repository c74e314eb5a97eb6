//! Error types surfaced by the core.

use thiserror::Error;

/// Returned by instruction dispatch. The CPU is left exactly as it was before the failing step.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    /// The fetched opcode has no entry in the dispatch table. Extended opcodes are reported as 0xCBxx.
    #[error("unimplemented opcode {opcode:#06X} at {pc:#06X}")]
    UnimplementedOpcode { opcode: u16, pc: u16 },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("not a save state (bad magic)")]
    BadMagic,
    #[error("unsupported save state version {0}")]
    UnsupportedVersion(u32),
    #[error("corrupt save state: {0}")]
    Corrupt(&'static str),
    #[error("save state encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("save state I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
