//! Instruction semantics, grouped by family. Each family module exposes a `register` function that claims its opcodes
//! in the dispatch table.

pub mod alu;
pub mod bits;
pub mod jump;
pub mod load;
pub mod misc;
pub mod rotate;
