//! Host-opaque values and callbacks (spec §4.4).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::ast::{F32, N32};
use crate::error::Result;

/// An extrinsic value: host-opaque data that rewrite rules carry around but
/// never inspect, except via `fork`/`is_zero` and the registered ext_fns.
pub trait ExtVal: fmt::Debug {
  /// Duplicate this value (spec: "must support fork (duplicate)").
  fn fork(&self) -> Box<dyn ExtVal>;

  /// Release this value. Primitive values are value-typed (no-op); a
  /// host-owned resource would free itself here.
  fn release(self: Box<Self>) {}

  /// Used by the `branch` rule to decide which alternative passes through.
  /// Only meaningful for primitive numerics; defaults to "truthy".
  fn is_zero(&self) -> bool {
    false
  }

  fn as_any(&self) -> &dyn Any;
}

/// The two primitive extrinsic numerics: fork = self (value semantics),
/// release = no-op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
  N32(N32),
  F32(F32),
}

impl ExtVal for Primitive {
  fn fork(&self) -> Box<dyn ExtVal> {
    Box::new(*self)
  }

  fn is_zero(&self) -> bool {
    match self {
      Primitive::N32(n) => n.0 == 0,
      Primitive::F32(f) => f.value() == 0.0,
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// A host value addressed by index into a [`crate::host::readback::Cache`].
/// Forking just copies the index (the cache owns the real value); release
/// is a no-op since the cache, not the port, owns the slot.
#[derive(Debug, Clone, Copy)]
pub struct Cached {
  pub idx: u32,
}

impl ExtVal for Cached {
  fn fork(&self) -> Box<dyn ExtVal> {
    Box::new(*self)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

pub type ExtFn = dyn Fn(Box<dyn ExtVal>, Box<dyn ExtVal>) -> Result<Box<dyn ExtVal>>;

/// Mapping from named external functions to host callbacks (spec §4.4).
#[derive(Default)]
pub struct Extrinsics {
  pub ext_fns: HashMap<String, Box<ExtFn>>,
}

impl Extrinsics {
  pub fn register(
    &mut self,
    name: impl Into<String>,
    f: impl Fn(Box<dyn ExtVal>, Box<dyn ExtVal>) -> Result<Box<dyn ExtVal>> + 'static,
  ) {
    self.ext_fns.insert(name.into(), Box::new(f));
  }
}
