//! The six rewrite rules and their dispatch (spec §4.3).

use crate::error::Result;
use crate::extrinsics::Primitive;
use crate::run::global::Global;
use crate::run::linker::{link, link_wire, Redex};
use crate::run::port::Port;
use crate::run::wire::{Heap, WireId};
use crate::trace::Observer;
use std::rc::Rc;

/// The tag+label a binary port carries, independent of its aux wire. Used
/// by `commute` to build fresh copies of each side's node shape.
#[derive(Clone)]
enum NodeShape {
  Comb(String),
  ExtFn(String),
  Branch,
}

impl NodeShape {
  fn of(port: &Port) -> Option<NodeShape> {
    match port {
      Port::Comb(label, _) => Some(NodeShape::Comb(label.clone())),
      Port::ExtFn(label, _) => Some(NodeShape::ExtFn(label.clone())),
      Port::Branch(_) => Some(NodeShape::Branch),
      _ => None,
    }
  }

  /// Allocates a fresh aux wire pair and wraps it in a port of this shape.
  /// Returns the port plus its two aux wire halves.
  fn instantiate(&self, heap: &mut Heap) -> Result<(Port, WireId, WireId)> {
    let w = heap.alloc_node()?;
    let (a, b) = (w, w.other_half());
    let port = match self {
      NodeShape::Comb(label) => Port::Comb(label.clone(), w),
      NodeShape::ExtFn(label) => Port::ExtFn(label.clone(), w),
      NodeShape::Branch => Port::Branch(w),
    };
    Ok((port, a, b))
  }

  fn same_as(&self, other: &NodeShape) -> bool {
    match (self, other) {
      (NodeShape::Comb(a), NodeShape::Comb(b)) => a == b,
      (NodeShape::ExtFn(a), NodeShape::ExtFn(b)) => a == b,
      (NodeShape::Branch, NodeShape::Branch) => true,
      _ => false,
    }
  }
}

/// Strips an `ExtFn` label's trailing `$` (the call-order-swap marker) for
/// extrinsics-map lookup (spec §4.3.5).
fn unwrap_label(label: &str) -> &str {
  label.strip_suffix('$').unwrap_or(label)
}

/// Toggles an `ExtFn` label's `$` suffix, used when deferring a call whose
/// second operand isn't ready yet (spec §4.3.5).
fn swap_label(label: &str) -> String {
  match label.strip_suffix('$') {
    Some(base) => base.to_owned(),
    None => format!("{label}$"),
  }
}

/// Brackets a single rule invocation with the `on_start_interaction` /
/// `on_complete_interaction` observer hooks (spec §4.5), mirroring
/// `ivm/vm.py`'s `track_interaction` context manager: `on_complete_interaction`
/// always fires, even if the rule itself errors out.
fn fire(
  observer: Option<&dyn Observer>,
  a_tag: &'static str,
  b_tag: &'static str,
  name: &'static str,
  rule: impl FnOnce() -> Result<()>,
) -> Result<()> {
  if let Some(obs) = observer {
    obs.on_start_interaction(a_tag, b_tag, name);
  }
  let result = rule();
  if let Some(obs) = observer {
    obs.on_complete_interaction();
  }
  result
}

/// Dispatches a redex to the appropriate rewrite rule, pushing any new
/// redexes it creates onto `fast`/`slow` per spec §4.2's classification.
#[allow(clippy::too_many_arguments)]
pub fn interact(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  extrinsics: &crate::extrinsics::Extrinsics,
  inert: &mut Vec<String>,
  a: Port,
  b: Port,
) -> Result<()> {
  let a_tag = a.tag_name();
  let b_tag = b.tag_name();

  // `(Global, Comb)` where the comb's label never appears anywhere the
  // global can reach gets duplicated instead of expanded (spec §4.3.8):
  // cheaper, and avoids inlining a definition that structurally can't
  // interact with this particular label anyway.
  match (&a, &b) {
    (Port::Global(g), Port::Comb(label, _)) | (Port::Comb(label, _), Port::Global(g)) => {
      if !g.labels().contains(label.as_str()) {
        let (comb, global) = match a {
          Port::Comb(..) => (a, b),
          _ => (b, a),
        };
        return fire(observer, a_tag, b_tag, "copy", || copy(heap, fast, slow, observer, comb, global));
      }
    }
    _ => {}
  }
  match (a, b) {
    (Port::Global(g), other) | (other, Port::Global(g)) => {
      fire(observer, a_tag, b_tag, "expand", || expand(heap, fast, slow, observer, inert, g, other))
    }
    (Port::ExtFn(label, wa), Port::ExtVal(v)) | (Port::ExtVal(v), Port::ExtFn(label, wa)) => {
      fire(observer, a_tag, b_tag, "call", || execute(heap, fast, slow, observer, extrinsics, &label, wa, v))
    }
    (Port::Branch(w), cond @ Port::ExtVal(_)) | (cond @ Port::ExtVal(_), Port::Branch(w)) => {
      fire(observer, a_tag, b_tag, "branch", || branch(heap, fast, slow, observer, w, cond))
    }
    (a, b) => {
      let shape_a = NodeShape::of(&a);
      let shape_b = NodeShape::of(&b);
      match (shape_a, shape_b) {
        (Some(sa), Some(sb)) if sa.same_as(&sb) => {
          fire(observer, a_tag, b_tag, "annihilate", || annihilate(heap, fast, slow, observer, a, b))
        }
        (Some(_), Some(_)) => fire(observer, a_tag, b_tag, "commute", || commute(heap, fast, slow, observer, a, b)),
        (Some(_), None) => fire(observer, a_tag, b_tag, "copy", || copy(heap, fast, slow, observer, a, b)),
        (None, Some(_)) => fire(observer, a_tag, b_tag, "copy", || copy(heap, fast, slow, observer, b, a)),
        (None, None) => fire(observer, a_tag, b_tag, "erase", || erase_erase(a, b)),
      }
    }
  }
}

fn erase_erase(a: Port, b: Port) -> Result<()> {
  a.release();
  b.release();
  Ok(())
}

/// Two nodes of the same tag and label meet principal-to-principal: cross
/// link their aux pairs (spec §4.3.1).
fn annihilate(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  a: Port,
  b: Port,
) -> Result<()> {
  let (a0, a1) = a.aux().expect("annihilate requires binary ports");
  let (b0, b1) = b.aux().expect("annihilate requires binary ports");
  link_wire(heap, fast, slow, observer, a0, b0);
  link_wire(heap, fast, slow, observer, a1, b1);
  Ok(())
}

/// Two nodes of differing tag/label meet principal-to-principal: each is
/// duplicated twice, cross-wired in a 2x2 grid, and the four original aux
/// wires are reattached to the four new principals (spec §4.3.2).
fn commute(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  a: Port,
  b: Port,
) -> Result<()> {
  let shape_a = NodeShape::of(&a).expect("commute requires binary ports");
  let shape_b = NodeShape::of(&b).expect("commute requires binary ports");
  let (a0, a1) = a.aux().unwrap();
  let (b0, b1) = b.aux().unwrap();

  let (a_for_b0, a0_l, a0_r) = shape_a.instantiate(heap)?;
  let (a_for_b1, a1_l, a1_r) = shape_a.instantiate(heap)?;
  let (b_for_a0, b0_l, b0_r) = shape_b.instantiate(heap)?;
  let (b_for_a1, b1_l, b1_r) = shape_b.instantiate(heap)?;

  link_wire(heap, fast, slow, observer, a0_l, b0_l);
  link_wire(heap, fast, slow, observer, a0_r, b1_l);
  link_wire(heap, fast, slow, observer, a1_l, b0_r);
  link_wire(heap, fast, slow, observer, a1_r, b1_r);

  link(heap, fast, slow, observer, b_for_a0, a0);
  link(heap, fast, slow, observer, b_for_a1, a1);
  link(heap, fast, slow, observer, a_for_b0, b0);
  link(heap, fast, slow, observer, a_for_b1, b1);
  Ok(())
}

/// A binary node meets a copyable nilary value (`Erase`, `Global`, or
/// `ExtVal`): a fresh fork goes to one aux, the original value itself to
/// the other — no extra fork, and nothing to release (spec §4.3.3).
fn copy(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  binary: Port,
  nilary: Port,
) -> Result<()> {
  let (x, y) = binary.aux().expect("copy requires a binary port on one side");
  let fork = nilary.fork();
  link(heap, fast, slow, observer, fork, x);
  link(heap, fast, slow, observer, nilary, y);
  Ok(())
}

/// A global meets anything: the global's instruction stream is executed
/// into fresh registers, and the resulting root port is linked against
/// whatever the global was interacting with (spec §4.3.4/§4.3.7).
#[allow(clippy::too_many_arguments)]
fn expand(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  inert: &mut Vec<String>,
  global: Rc<Global>,
  other: Port,
) -> Result<()> {
  let instructions = global.instructions();
  let mut regs: Vec<WireId> = Vec::with_capacity(instructions.register_count().max(1) as usize);
  regs.push(heap.new_wire()?);
  for _ in 1..instructions.register_count().max(1) {
    regs.push(heap.new_wire()?);
  }

  for instr in &instructions.list {
    execute_instruction(heap, fast, slow, observer, inert, &regs, instr)?;
  }

  let root_wire = regs[0];
  link(heap, fast, slow, observer, other, root_wire);
  Ok(())
}

fn execute_instruction(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  inert: &mut Vec<String>,
  regs: &[WireId],
  instr: &crate::run::global::Instruction,
) -> Result<()> {
  use crate::run::global::{BinaryTag, Instruction, PortTemplate};
  match instr {
    Instruction::Nilary { to, port, .. } => {
      let port = match port {
        PortTemplate::Erase => Port::Erase,
        PortTemplate::N32(n) => Port::ExtVal(Box::new(Primitive::N32(*n))),
        PortTemplate::F32(n) => Port::ExtVal(Box::new(Primitive::F32(*n))),
        PortTemplate::GlobalRef(g) => Port::Global(Rc::clone(g)),
      };
      link(heap, fast, slow, observer, port, regs[*to as usize]);
    }
    Instruction::Binary { tag, label, to, a, b, .. } => {
      let own = heap.alloc_node()?;
      let port = match tag {
        BinaryTag::Comb => Port::Comb(label.clone(), own),
        BinaryTag::ExtFn => Port::ExtFn(label.clone(), own),
        BinaryTag::Branch => Port::Branch(own),
      };
      link_wire(heap, fast, slow, observer, own, regs[*a as usize]);
      link_wire(heap, fast, slow, observer, own.other_half(), regs[*b as usize]);
      link(heap, fast, slow, observer, port, regs[*to as usize]);
    }
    Instruction::Inert { to, from, opaque } => {
      // Transparent forwarding: whatever `from` resolves to is linked
      // straight through into `to`. `#[tree]` black boxes additionally
      // leave a breadcrumb for introspection; plain variable aliasing does
      // not (see the `Inert` doc comment in `run::global`).
      if *opaque {
        inert.push(format!("{from} -> {to}"));
      }
      link_wire(heap, fast, slow, observer, regs[*to as usize], regs[*from as usize]);
    }
  }
  Ok(())
}

/// An `ExtFn` node's principal meets an `ExtVal`: if the other operand
/// (aux wire `rhs`) already holds a concrete value, both are ready and the
/// extrinsic fires immediately. Otherwise, a swapped copy of the node is
/// created to wait on `rhs`, remembering the operand that already arrived
/// (spec §4.3.5).
#[allow(clippy::too_many_arguments)]
fn execute(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  extrinsics: &crate::extrinsics::Extrinsics,
  label: &str,
  w: WireId,
  meeting: Box<dyn crate::extrinsics::ExtVal>,
) -> Result<()> {
  let (rhs, out) = (w, w.other_half());
  let rhs_ready = matches!(heap.target(rhs), Some(Port::ExtVal(_)));
  if rhs_ready {
    let operand = match heap.take_target(rhs) {
      Some(Port::ExtVal(v)) => v,
      _ => unreachable!(),
    };
    heap.free_wire(rhs);
    let base = unwrap_label(label);
    let f = extrinsics
      .ext_fns
      .get(base)
      .unwrap_or_else(|| panic!("missing extrinsic {base:?}"));
    let result = f(meeting, operand)?;
    link(heap, fast, slow, observer, Port::ExtVal(result), out);
    return Ok(());
  }

  let new_label = swap_label(label);
  let new_w = heap.alloc_node()?;
  let (new_a, new_b) = (new_w, new_w.other_half());
  link(heap, fast, slow, observer, Port::ExtFn(new_label, new_w), rhs);
  link(heap, fast, slow, observer, Port::ExtVal(meeting), new_a);
  link_wire(heap, fast, slow, observer, new_b, out);
  Ok(())
}

/// A `Branch` node's principal meets an `ExtVal` condition: a fresh
/// commute-copy of the node is spliced in so the first aux (the condition
/// carrier) picks which of the two original alternatives survives, and the
/// dropped one is erased (spec §4.3.6).
fn branch(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  w: WireId,
  cond: Port,
) -> Result<()> {
  let is_zero = match &cond {
    Port::ExtVal(v) => v.is_zero(),
    _ => unreachable!("branch condition must be an ext_val"),
  };
  cond.release();
  let (b1, b2) = (w, w.other_half());
  let new_w = heap.alloc_node()?;
  let (z, p) = (new_w, new_w.other_half());
  link(heap, fast, slow, observer, Port::Branch(new_w), b1);
  let (y, n) = if is_zero { (z, p) } else { (p, z) };
  link(heap, fast, slow, observer, Port::Erase, n);
  link_wire(heap, fast, slow, observer, b2, y);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extrinsics::Extrinsics;

  #[test]
  fn annihilate_links_matching_aux_pairs() {
    let mut heap = Heap::new(64);
    let wa = heap.alloc_node().unwrap();
    let wb = heap.alloc_node().unwrap();
    let a = Port::Comb("x".to_owned(), wa);
    let b = Port::Comb("x".to_owned(), wb);
    let mut fast = vec![];
    let mut slow = vec![];
    let mut inert = vec![];
    let extrinsics = Extrinsics::default();
    interact(&mut heap, &mut fast, &mut slow, None, &extrinsics, &mut inert, a, b).unwrap();
  }

  #[test]
  fn copy_forks_once_and_reuses_the_original_for_the_other_aux() {
    let mut heap = Heap::new(64);
    let wb = heap.alloc_node().unwrap();
    let binary = Port::Comb("x".to_owned(), wb);
    let nilary = Port::Erase;
    let mut fast = vec![];
    let mut slow = vec![];
    copy(&mut heap, &mut fast, &mut slow, None, binary, nilary).unwrap();
    // Both aux wires of the comb now hold Erase (one forked, one reused);
    // neither was ever left empty or double-freed.
    assert!(matches!(heap.target(wb), Some(Port::Erase)));
    assert!(matches!(heap.target(wb.other_half()), Some(Port::Erase)));
  }

  #[test]
  fn swap_label_toggles_trailing_dollar() {
    assert_eq!(swap_label("n32_sub"), "n32_sub$");
    assert_eq!(swap_label("n32_sub$"), "n32_sub");
    assert_eq!(unwrap_label("n32_sub$"), "n32_sub");
    assert_eq!(unwrap_label("n32_sub"), "n32_sub");
  }
}
