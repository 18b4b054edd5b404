//! The reduction engine: heap, ports, global expansion, and the rewrite
//! rules that drive a net to normal form.

pub mod global;
pub mod interact;
pub mod linker;
pub mod net;
pub mod port;
pub mod wire;

pub use global::{BinaryTag, Global, Instruction, Instructions, PortTemplate};
pub use net::Vm;
pub use port::Port;
pub use wire::{Heap, WireId};

/// Runtime configuration (spec §12): currently just the heap's size cap.
#[derive(Debug, Clone, Copy)]
pub struct Config {
  pub max_size: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config { max_size: 1 << 20 }
  }
}
