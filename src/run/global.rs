//! Compiled global definitions: an instruction stream plus the label set the
//! `call` rule must agree on before a global may be inlined (spec §3.4/§3.5).

use std::cell::OnceCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{Span, F32, N32};

/// The shape a `Nilary` instruction materializes into a fresh register.
#[derive(Debug, Clone)]
pub enum PortTemplate {
  Erase,
  N32(N32),
  F32(F32),
  GlobalRef(Rc<Global>),
}

/// The binary node kinds a `Binary` instruction can materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryTag {
  Comb,
  ExtFn,
  Branch,
}

/// One step of a global's compiled body (spec §4.3.7/§4.3.8).
#[derive(Debug, Clone)]
pub enum Instruction {
  /// Materialize a nilary port directly into register `to`.
  Nilary { to: u32, port: PortTemplate, span: Option<Span> },
  /// Materialize a binary node into register `to`, with its two aux wires
  /// bound to registers `a` and `b`.
  Binary { tag: BinaryTag, label: String, to: u32, a: u32, b: u32, span: Option<Span> },
  /// Forwards whatever register `from` holds into register `to` by linking
  /// their wires directly. Used for two distinct purposes: a `#[tree]`
  /// black box (`opaque: true`, also recorded for introspection — never
  /// consumed by readback; see DESIGN.md), and tying a repeated variable's
  /// second occurrence back to its first (`opaque: false`, purely an
  /// encoder bookkeeping device with nothing to show a caller).
  Inert { to: u32, from: u32, opaque: bool },
}

/// A compiled global body: a flat instruction list plus a register
/// allocator. Register 0 is reserved for the net's root.
#[derive(Debug, Default)]
pub struct Instructions {
  pub list: Vec<Instruction>,
  next_register: u32,
}

impl Instructions {
  pub fn new() -> Self {
    Instructions { list: Vec::new(), next_register: 1 }
  }

  /// Allocates a fresh register, never reusing register 0.
  pub fn new_register(&mut self) -> u32 {
    let r = self.next_register;
    self.next_register += 1;
    r
  }

  pub fn push(&mut self, instr: Instruction) {
    self.list.push(instr);
  }

  pub fn register_count(&self) -> u32 {
    self.next_register
  }
}

/// A named global definition: the compiled instruction stream that expands
/// it, plus the set of labels its expansion can introduce (used by `call`
/// to decide whether a `Comb` on the other side of the redex needs its own
/// label added to the closure before commuting can proceed; spec §4.3.8).
#[derive(Debug)]
pub struct Global {
  pub name: String,
  instructions: OnceCell<Instructions>,
  labels: OnceCell<HashSet<String>>,
}

impl Global {
  /// A named placeholder, registered up front so mutually-referencing
  /// globals can embed each other's `Rc<Global>` identity before either
  /// one's body has actually been compiled (the encoder's two-phase
  /// insertion; see `host::Host::insert_nets`).
  pub fn placeholder(name: impl Into<String>) -> Self {
    Global { name: name.into(), instructions: OnceCell::new(), labels: OnceCell::new() }
  }

  pub fn instructions(&self) -> &Instructions {
    self.instructions.get().expect("global body read before it was compiled")
  }

  pub fn set_instructions(&self, instructions: Instructions) {
    self.instructions.set(instructions).expect("global body compiled twice");
  }

  /// The label-set closure: the labels of every `Comb`/`ExtFn` a call to
  /// this global can ever introduce, transitively through any globals it
  /// calls (spec §3.5/§4.3.8). Established once by the encoder.
  pub fn labels(&self) -> &HashSet<String> {
    self.labels.get_or_init(HashSet::new)
  }

  pub fn set_labels(&self, labels: HashSet<String>) {
    // Globals are compiled once, up front; a second attempt to set the
    // label closure indicates a bug in the encoder, not a legitimate retry.
    self.labels.set(labels).expect("global labels set twice");
  }
}

impl PartialEq for Global {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}
impl Eq for Global {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registers_start_at_one() {
    let mut instrs = Instructions::new();
    assert_eq!(instrs.new_register(), 1);
    assert_eq!(instrs.new_register(), 2);
    assert_eq!(instrs.register_count(), 3);
  }

  #[test]
  fn labels_are_memoized() {
    let g = Global::placeholder("::main");
    g.set_instructions(Instructions::new());
    g.set_labels(HashSet::from(["fn".to_owned()]));
    assert!(g.labels().contains("fn"));
  }
}
