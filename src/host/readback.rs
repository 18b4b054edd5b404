//! Reconstructs a [`Tree`] by walking a live, normalized graph (spec §6.3).

use std::any::Any;
use std::collections::HashMap;

use crate::ast::{Net, Tree, TreeKind};
use crate::extrinsics::{Cached, ExtVal, Primitive};
use crate::run::linker::follow;
use crate::run::port::Port;
use crate::run::wire::{Heap, WireId};
use crate::util::maybe_grow;

/// Side tables backing [`Cached`] ports: an opaque host value and its
/// (possibly stale) serialized form, addressed by the same index the port
/// carries. The cache — not the port — owns the value, so forking a
/// `Cached` port is just copying its index.
#[derive(Default)]
pub struct Cache {
  values: Vec<Box<dyn Any>>,
  serialized: Vec<Tree>,
}

impl Cache {
  pub fn insert(&mut self, value: Box<dyn Any>, serialized: Tree) -> Cached {
    let idx = self.values.len() as u32;
    self.values.push(value);
    self.serialized.push(serialized);
    Cached { idx }
  }

  pub fn value(&self, idx: u32) -> &dyn Any {
    self.values[idx as usize].as_ref()
  }

  pub fn serialized(&self, idx: u32) -> &Tree {
    &self.serialized[idx as usize]
  }
}

/// Walks a normalized graph starting from a wire, producing the [`Tree`]
/// it denotes. Wires visited a second time (indirection cycles left by an
/// incomplete reduction) are given a fresh variable name instead of being
/// walked again.
pub struct Reader<'a> {
  heap: &'a Heap,
  cache: &'a Cache,
  seen: HashMap<WireId, String>,
  next_var: u32,
}

impl<'a> Reader<'a> {
  pub fn new(heap: &'a Heap, cache: &'a Cache) -> Self {
    Reader { heap, cache, seen: HashMap::new(), next_var: 0 }
  }

  fn fresh_var(&mut self) -> String {
    let n = self.next_var;
    self.next_var += 1;
    format!("v{n}")
  }

  pub fn read_wire(&mut self, w: WireId) -> Tree {
    let w = follow(self.heap, w);
    if let Some(name) = self.seen.get(&w) {
      return Tree::var(name.clone());
    }
    match self.heap.target(w) {
      None => {
        let name = self.fresh_var();
        self.seen.insert(w, name.clone());
        Tree::var(name)
      }
      Some(port) => self.read_port(port),
    }
  }

  fn read_port(&mut self, port: &Port) -> Tree {
    maybe_grow(|| match port {
      Port::Erase => Tree::erase(),
      Port::Wire(_) => unreachable!("follow() already resolved indirections"),
      Port::Global(g) => Tree::new(TreeKind::Global(g.name.clone()), None),
      Port::ExtVal(v) => self.read_ext_val(v.as_ref()),
      Port::Comb(label, w) => {
        let (a, b) = (*w, w.other_half());
        let ta = self.read_wire(a);
        let tb = self.read_wire(b);
        Tree::comb(label.clone(), ta, tb)
      }
      Port::ExtFn(label, w) => {
        let (a, b) = (*w, w.other_half());
        let ta = self.read_wire(a);
        let tb = self.read_wire(b);
        Tree::new(TreeKind::ExtFn(label.clone(), Box::new(ta), Box::new(tb)), None)
      }
      Port::Branch(w) => self.read_branch(*w),
    })
  }

  /// Reconstructs a ternary from a `Branch` node. Our own encoder lowers a
  /// ternary to two nested `Branch` nodes, so the condition's wire (`p1`)
  /// points at another `Branch` whose aux pair is the ternary's first two
  /// arms. We check that by following `p1` and inspecting the *port*
  /// non-destructively — not by reading it back first and matching on the
  /// resulting tree's kind, since an ordinary value can never read back as
  /// `TreeKind::Branch` (nothing else produces one). When `p1` isn't itself
  /// a `Branch` port, the nesting our own encoder produces doesn't apply
  /// (built some other way, or mid-reduction); we preserve the shape as-is
  /// with a synthetic `?^` combinator rather than guessing.
  fn read_branch(&mut self, w: WireId) -> Tree {
    let (p1, p2) = (w, w.other_half());
    let inner = follow(self.heap, p1);
    if let Some(&Port::Branch(iw)) = self.heap.target(inner) {
      let (p11, p12) = (iw, iw.other_half());
      let t11 = self.read_wire(p11);
      let t12 = self.read_wire(p12);
      let t2 = self.read_wire(p2);
      return Tree::new(TreeKind::Branch(Box::new(t11), Box::new(t12), Box::new(t2)), None);
    }
    let t1 = self.read_wire(p1);
    let t2 = self.read_wire(p2);
    Tree::comb("?^", t1, t2)
  }

  fn read_ext_val(&self, v: &dyn ExtVal) -> Tree {
    if let Some(p) = v.as_any().downcast_ref::<Primitive>() {
      return match p {
        Primitive::N32(n) => Tree::new(TreeKind::N32(*n), None),
        Primitive::F32(f) => Tree::new(TreeKind::F32(*f), None),
      };
    }
    if let Some(c) = v.as_any().downcast_ref::<Cached>() {
      return self.cache.serialized(c.idx).clone();
    }
    unreachable!("unrecognized ext_val kind reached readback")
  }
}

/// Reads back a whole net rooted at `root`, with `pairs` left empty since a
/// normalized net has no remaining active redexes by definition.
pub fn read_net(heap: &Heap, cache: &Cache, root: WireId) -> Net {
  let mut reader = Reader::new(heap, cache);
  Net { root: reader.read_wire(root), pairs: Vec::new() }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Builds the two-node nested shape `encode_tree_inner` lowers a ternary
  /// to by hand (no normalization ever touches this — nothing here is a
  /// redex), and checks `read_branch` reconstructs a single `?(then els
  /// cond)` rather than the flat `?^` fallback. Regression test for a bug
  /// where the nested-vs-not check read `p1` back into a `Tree` first and
  /// matched on *its* kind — which can never be `TreeKind::Branch`, since
  /// no port ever reads back as one, so the nested case was unreachable.
  #[test]
  fn read_branch_reconstructs_a_nested_ternary() {
    let mut heap = Heap::new(64);

    let inner = heap.alloc_node().unwrap();
    heap.swap_target(inner, Port::ExtVal(Box::new(Primitive::N32(crate::ast::N32(11)))));
    heap.swap_target(inner.other_half(), Port::ExtVal(Box::new(Primitive::N32(crate::ast::N32(22)))));

    let outer = heap.alloc_node().unwrap();
    heap.swap_target(outer, Port::Branch(inner));
    heap.swap_target(outer.other_half(), Port::ExtVal(Box::new(Primitive::N32(crate::ast::N32(99)))));

    let cond = heap.new_wire().unwrap();
    heap.swap_target(cond, Port::Branch(outer));

    let cache = Cache::default();
    let mut reader = Reader::new(&heap, &cache);
    let tree = reader.read_wire(cond);

    match tree.kind {
      TreeKind::Branch(then, els, cond) => {
        assert_eq!(*then, Tree::n32(11));
        assert_eq!(*els, Tree::n32(22));
        assert_eq!(*cond, Tree::n32(99));
      }
      other => panic!("expected a reconstructed ternary, got {other:?}"),
    }
  }

  /// A `Branch` whose first aux isn't itself a `Branch` port falls back to
  /// the flat `?^` combinator, preserving the shape as-is.
  #[test]
  fn read_branch_falls_back_to_flat_comb_when_not_nested() {
    let mut heap = Heap::new(64);

    let w = heap.alloc_node().unwrap();
    heap.swap_target(w, Port::ExtVal(Box::new(Primitive::N32(crate::ast::N32(1)))));
    heap.swap_target(w.other_half(), Port::ExtVal(Box::new(Primitive::N32(crate::ast::N32(2)))));

    let cond = heap.new_wire().unwrap();
    heap.swap_target(cond, Port::Branch(w));

    let cache = Cache::default();
    let mut reader = Reader::new(&heap, &cache);
    let tree = reader.read_wire(cond);

    match tree.kind {
      TreeKind::Comb(label, a, b) => {
        assert_eq!(label, "?^");
        assert_eq!(*a, Tree::n32(1));
        assert_eq!(*b, Tree::n32(2));
      }
      other => panic!("expected the ?^ fallback comb, got {other:?}"),
    }
  }
}
