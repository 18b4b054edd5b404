//! Tagged ports: what a wire's target can be (spec §3.2).

use std::rc::Rc;

use crate::extrinsics::ExtVal;
use crate::run::global::Global;
use crate::run::wire::WireId;

/// A live value at rest in the heap or in flight between interactions.
///
/// Binary ports (`Comb`, `ExtFn`, `Branch`) store only their principal
/// wire; the aux pair is always `(target, target.other_half())` (spec §9).
pub enum Port {
  Erase,
  ExtVal(Box<dyn ExtVal>),
  Wire(WireId),
  Global(Rc<Global>),
  Comb(String, WireId),
  ExtFn(String, WireId),
  Branch(WireId),
}

impl Port {
  /// The aux pair of a binary port, or `None` for a nilary one.
  pub fn aux(&self) -> Option<(WireId, WireId)> {
    match self {
      Port::Comb(_, target) | Port::ExtFn(_, target) | Port::Branch(target) => {
        Some((*target, target.other_half()))
      }
      _ => None,
    }
  }

  pub fn is_nilary(&self) -> bool {
    self.aux().is_none()
  }

  /// True for the three kinds the `copy` rule is allowed to duplicate
  /// without allocating a fresh node (spec §4.3.3).
  pub fn is_copyable_nilary(&self) -> bool {
    matches!(self, Port::Erase | Port::Global(_) | Port::ExtVal(_))
  }

  /// Duplicates a nilary port. Panics on binary ports; callers must check
  /// [`Port::is_copyable_nilary`] (or go through the `copy` rewrite rule,
  /// which always does) first.
  pub fn fork(&self) -> Port {
    match self {
      Port::Erase => Port::Erase,
      Port::Global(g) => Port::Global(Rc::clone(g)),
      Port::ExtVal(v) => Port::ExtVal(v.fork()),
      _ => unreachable!("fork() called on a non-nilary port"),
    }
  }

  /// Releases a nilary port's resources. No-op for `Erase`/`Global`; forwards
  /// to the extrinsic's own release for `ExtVal`.
  pub fn release(self) {
    match self {
      Port::ExtVal(v) => v.release(),
      Port::Erase | Port::Global(_) => {}
      _ => unreachable!("release() called on a non-nilary port"),
    }
  }

  pub fn tag_name(&self) -> &'static str {
    match self {
      Port::Erase => "erase",
      Port::ExtVal(_) => "ext_val",
      Port::Wire(_) => "wire",
      Port::Global(_) => "global",
      Port::Comb(..) => "comb",
      Port::ExtFn(..) => "ext_fn",
      Port::Branch(_) => "branch",
    }
  }
}

impl std::fmt::Debug for Port {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Port::Erase => write!(f, "Erase"),
      Port::ExtVal(v) => write!(f, "ExtVal({v:?})"),
      Port::Wire(w) => write!(f, "Wire({w:?})"),
      Port::Global(g) => write!(f, "Global({:?})", g.name),
      Port::Comb(label, w) => write!(f, "Comb({label:?}, {w:?})"),
      Port::ExtFn(label, w) => write!(f, "ExtFn({label:?}, {w:?})"),
      Port::Branch(w) => write!(f, "Branch({w:?})"),
    }
  }
}
