//! The virtual machine: heap, scheduling queues, registers, and the
//! normalize loop that drives interactions to completion (spec §4.1/§5).

use std::rc::Rc;

use crate::error::Result;
use crate::extrinsics::Extrinsics;
use crate::run::global::Global;
use crate::run::interact::interact;
use crate::run::linker::{link, link_wire, Redex};
use crate::run::port::Port;
use crate::run::wire::{Heap, WireId};
use crate::trace::Observer;

/// One pass through a net: allocate a heap, wire up a global's expansion
/// against a boot argument, and run interactions to normal form.
pub struct Vm {
  pub heap: Heap,
  active_fast: Vec<Redex>,
  active_slow: Vec<Redex>,
  pub extrinsics: Rc<Extrinsics>,
  pub observer: Option<Box<dyn Observer>>,
  /// `#[tree]` black boxes recorded for introspection only; never consumed
  /// by readback (see DESIGN.md's Inert ledger entry).
  pub inert: Vec<String>,
  interactions: u64,
}

impl Vm {
  /// `extrinsics` is `Rc`-shared with the [`crate::host::Host`] that booted
  /// this `Vm`, since the registered callbacks (`Box<dyn Fn>`) aren't
  /// `Clone` and every `Vm` a host boots needs the same registry.
  pub fn new(max_size: usize, extrinsics: Rc<Extrinsics>) -> Self {
    Vm {
      heap: Heap::new(max_size),
      active_fast: Vec::new(),
      active_slow: Vec::new(),
      extrinsics,
      observer: None,
      inert: Vec::new(),
      interactions: 0,
    }
  }

  pub fn interactions(&self) -> u64 {
    self.interactions
  }

  /// Boots execution by linking `global` directly against `arg` (spec
  /// §6.2's `boot` operation — `link(GlobalPort(g), arg)` in
  /// `ivm/vm.py`). Returns nothing: unlike a register, there is no wire
  /// left over from this call that stays valid to read back from — by the
  /// time `boot` returns, the temporary wire used to form the redex has
  /// already been freed. Callers that need a result to read back must
  /// allocate their own sink wire (`vm.heap.alloc_node()`) and weave it
  /// into `arg` themselves before calling `boot`, exactly as the literal
  /// end-to-end scenarios do (spec §8).
  ///
  /// `vm.py::boot` forks its argument before linking it in, because there
  /// the caller keeps its own `ext_val` reference and needs it to stay
  /// valid for reuse after `boot` returns. Here `arg` is taken by value: the
  /// caller has already given up ownership by the time this call is made,
  /// so there is no surviving alias left to protect, and forking would only
  /// allocate a duplicate nobody consumes (and, for a host-owned `ExtVal`,
  /// one that never gets `release`d). `arg` is linked directly instead.
  pub fn boot(&mut self, global: &Rc<Global>, arg: Port) -> Result<()> {
    let root = self.heap.new_wire()?;
    self.link(Port::Global(Rc::clone(global)), root);
    self.link(arg, root);
    Ok(())
  }

  /// Plugs `port` into wire `w`, routing any redex this forms to whichever
  /// queue spec §4.2's classification table assigns it to.
  pub fn link(&mut self, port: Port, w: WireId) {
    let obs = self.observer.as_deref();
    link(&mut self.heap, &mut self.active_fast, &mut self.active_slow, obs, port, w);
  }

  pub fn link_wire(&mut self, a: WireId, b: WireId) {
    let obs = self.observer.as_deref();
    link_wire(&mut self.heap, &mut self.active_fast, &mut self.active_slow, obs, a, b);
  }

  /// Drains the active queues until both are empty, running the fast queue
  /// to exhaustion before ever touching the slow one (spec §5: fast has
  /// strict priority).
  pub fn normalize(&mut self) -> Result<()> {
    loop {
      while let Some((a, b)) = self.active_fast.pop() {
        self.step(a, b)?;
      }
      match self.active_slow.pop() {
        Some((a, b)) => self.step(a, b)?,
        None => break,
      }
    }
    Ok(())
  }

  /// `on_start_interaction`/`on_complete_interaction` (spec §4.5) bracket
  /// the rule that actually fires, not this generic dispatch step, since
  /// only `interact`'s dispatch knows which named rule (`annihilate`,
  /// `commute`, ...) a given redex resolves to.
  fn step(&mut self, a: Port, b: Port) -> Result<()> {
    interact(
      &mut self.heap,
      &mut self.active_fast,
      &mut self.active_slow,
      self.observer.as_deref(),
      &self.extrinsics,
      &mut self.inert,
      a,
      b,
    )?;
    self.interactions += 1;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::run::global::Instructions;

  #[test]
  fn booting_an_empty_global_normalizes_with_no_interactions() {
    let g = Global::placeholder("::id");
    g.set_instructions(Instructions::new());
    let g = Rc::new(g);
    let mut vm = Vm::new(1024, Rc::new(Extrinsics::default()));
    vm.boot(&g, Port::Erase).unwrap();
    vm.normalize().unwrap();
  }
}
