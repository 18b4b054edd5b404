//! Concrete error types for the abstract taxonomy of recoverable failures.
//!
//! `UnreachableState`, `LeakedRegister` and `MissingExtrinsic` are not
//! represented here: they are programming invariants, not inputs a caller
//! can recover from, and surface as `panic!`/`unreachable!()` at their call
//! sites instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{message} (line {line}, columns {col_start}..{col_end})")]
  Syntax { message: String, line: usize, col_start: usize, col_end: usize },

  #[error("unknown global {0:?}")]
  UnknownGlobal(String),

  #[error("heap exceeded its max_size of {max_size} wires")]
  OutOfMemory { max_size: usize },

  #[error("numeric literal {literal:?} does not fit in 32 bits")]
  NumericOverflow { literal: String },

  #[error("extrinsic call failed: {0}")]
  Extrinsic(String),

  #[error("input file {0:?} not found")]
  FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
