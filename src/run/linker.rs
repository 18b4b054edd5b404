//! Link/follow protocol: the primitive wire operations every rewrite rule is
//! built from (spec §4.2).

use crate::run::port::Port;
use crate::run::wire::{Heap, WireId};
use crate::trace::Observer;

/// A pair of principal ports ready to interact.
pub type Redex = (Port, Port);

/// Dereferences `w` through any `Port::Wire` indirections, returning the
/// terminal wire: either still empty, or holding a concrete (non-`Wire`)
/// port. Non-destructive: used by readback, which only ever borrows the
/// heap immutably.
pub fn follow(heap: &Heap, mut w: WireId) -> WireId {
  while let Some(Port::Wire(next)) = heap.target(w) {
    w = *next;
  }
  w
}

/// Destructive variant of [`follow`]: every indirection wire traversed is
/// freed as it's passed, since once resolved it serves no further purpose
/// (spec §4.2's `follow(p, destructive=true)`).
fn follow_mut(heap: &mut Heap, observer: Option<&dyn Observer>, mut w: WireId) -> WireId {
  loop {
    match heap.target(w) {
      Some(&Port::Wire(next)) => {
        heap.free_wire(w);
        if let Some(obs) = observer {
          obs.on_free_wire();
        }
        w = next;
      }
      _ => return w,
    }
  }
}

/// Routes a freshly-formed redex to the right queue, or resolves it on the
/// spot, per spec §4.2's `link(a, b)` decision table.
fn route(fast: &mut Vec<Redex>, slow: &mut Vec<Redex>, a: Port, b: Port) {
  let global_or_erase = |p: &Port| matches!(p, Port::Global(_) | Port::Erase);
  let extval_or_erase = |p: &Port| matches!(p, Port::ExtVal(_) | Port::Erase);
  if (global_or_erase(&a) && global_or_erase(&b)) || (extval_or_erase(&a) && extval_or_erase(&b)) {
    a.release();
    b.release();
    return;
  }
  let same_label_binary = match (&a, &b) {
    (Port::Comb(la, _), Port::Comb(lb, _)) => la == lb,
    (Port::ExtFn(la, _), Port::ExtFn(lb, _)) => la == lb,
    _ => false,
  };
  if same_label_binary {
    fast.push((a, b));
    return;
  }
  let is_binary = |p: &Port| matches!(p, Port::Comb(..) | Port::ExtFn(..) | Port::Branch(_));
  if matches!(a, Port::Global(_)) || matches!(b, Port::Global(_)) || (is_binary(&a) && is_binary(&b)) {
    slow.push((a, b));
    return;
  }
  fast.push((a, b));
}

/// Plugs `port` into wire-end `w`. If something concrete was already
/// plugged in on the far side, the two ports now face each other: that is
/// a redex, routed to whichever queue spec §4.2 assigns it to (or resolved
/// immediately if it's an erase pair). Otherwise `port` is simply stored.
pub fn link(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  port: Port,
  w: WireId,
) {
  if let Some(obs) = observer {
    obs.on_link(port.tag_name(), "wire");
  }
  let w = follow_mut(heap, observer, w);
  match heap.take_target(w) {
    Some(existing) => {
      // `w`'s slot is already empty now that `existing` has been taken out
      // of it; tell the heap so it can reclaim the pair once its sibling
      // half is free too.
      heap.free_wire(w);
      if let Some(obs) = observer {
        obs.on_free_wire();
      }
      route(fast, slow, port, existing);
    }
    None => {
      heap.swap_target(w, port);
    }
  }
}

/// Connects two wire-ends to each other directly, with no port of its own
/// to plug in. If one side already held a concrete port, that port is
/// linked through to the other side (possibly forming a redex); if both
/// were empty, only one side (`a`) is pointed at the other via a `Wire`
/// indirection — `b` stays terminal, so a later `follow` through `a`
/// reaches `b` in one hop instead of looping between two mutually-pointing
/// wires.
pub fn link_wire(
  heap: &mut Heap,
  fast: &mut Vec<Redex>,
  slow: &mut Vec<Redex>,
  observer: Option<&dyn Observer>,
  a: WireId,
  b: WireId,
) {
  if let Some(obs) = observer {
    obs.on_link_wire();
  }
  let fa = follow_mut(heap, observer, a);
  let fb = follow_mut(heap, observer, b);
  if fa == fb {
    // A wire looped back on itself with nothing plugged in; both ends are
    // vacuous and can simply be dropped.
    heap.free_wire(fa);
    if let Some(obs) = observer {
      obs.on_free_wire();
    }
    return;
  }
  match heap.take_target(fa) {
    Some(pa) => {
      heap.free_wire(fa);
      if let Some(obs) = observer {
        obs.on_free_wire();
      }
      link(heap, fast, slow, observer, pa, fb)
    }
    None => match heap.take_target(fb) {
      Some(pb) => {
        heap.free_wire(fb);
        if let Some(obs) = observer {
          obs.on_free_wire();
        }
        link(heap, fast, slow, observer, pb, fa)
      }
      None => {
        heap.swap_target(fa, Port::Wire(fb));
      }
    },
  }
}
