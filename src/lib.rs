//! An interaction-net virtual machine: heap, link/follow protocol,
//! interaction dispatch, global expansion and readback.

pub mod ast;
pub mod error;
pub mod extrinsics;
pub mod host;
pub mod run;
pub mod stdlib;
pub mod trace;
pub mod util;
