//! The host façade: the single entry point embedding code is expected to
//! use (spec §4.8). Owns the global table, the extrinsics registry, the
//! readback cache, and the host's I/O sinks.

pub mod encode;
pub mod readback;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read as IoRead, Write as IoWrite};
use std::path::Path;
use std::rc::Rc;

use crate::ast::{Net, Nets};
use crate::error::{Error, Result};
use crate::extrinsics::{Cached, ExtVal, Extrinsics, Primitive};
use crate::run::{Config, Global, Port, Vm, WireId};

pub use readback::Cache;

/// The host façade. Construct one, feed it source via [`Host::insert_nets`]
/// (or [`Host::parse_file`] first), then [`Host::boot`]/[`Host::execute`]
/// a particular global.
pub struct Host {
  pub defs: HashMap<String, Rc<Global>>,
  /// `Rc`-shared with every [`Vm`] this host boots, so a single registry of
  /// extrinsic functions backs them all (see DESIGN.md).
  pub extrinsics: Rc<Extrinsics>,
  /// `Rc<RefCell<_>>` so the `"cache"` extrinsic (registered below) can
  /// reach the same table `add_constant`/`readback` use, without threading
  /// the host itself through the extrinsics registry.
  pub cache: Rc<RefCell<Cache>>,
  pub config: Config,
  pub stdout: Rc<RefCell<dyn IoWrite>>,
  pub stdin: Rc<RefCell<dyn IoRead>>,
}

impl Host {
  pub fn new(config: Config) -> Self {
    let stdout: Rc<RefCell<dyn IoWrite>> = Rc::new(RefCell::new(io::stdout()));
    let stdin: Rc<RefCell<dyn IoRead>> = Rc::new(RefCell::new(io::stdin()));
    let cache = Rc::new(RefCell::new(Cache::default()));
    let mut extrinsics = Extrinsics::default();
    crate::stdlib::register(&mut extrinsics, Rc::clone(&stdout), Rc::clone(&stdin));
    register_cache_ext_fn(&mut extrinsics, Rc::clone(&cache));
    Host { defs: HashMap::new(), extrinsics: Rc::new(extrinsics), cache, config, stdout, stdin }
  }

  /// Swaps in host-provided I/O sinks, e.g. to capture output in tests
  /// instead of writing to the process's real stdout/stdin.
  pub fn with_io(mut self, stdout: Rc<RefCell<dyn IoWrite>>, stdin: Rc<RefCell<dyn IoRead>>) -> Self {
    let mut extrinsics = Extrinsics::default();
    crate::stdlib::register(&mut extrinsics, Rc::clone(&stdout), Rc::clone(&stdin));
    register_cache_ext_fn(&mut extrinsics, Rc::clone(&self.cache));
    self.extrinsics = Rc::new(extrinsics);
    self.stdout = stdout;
    self.stdin = stdin;
    self
  }

  pub fn parse_file(path: impl AsRef<Path>) -> Result<Nets> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
      .map_err(|_| Error::FileNotFound(path.display().to_string()))?;
    crate::ast::parser::Parser::new(&source).parse_nets()
  }

  /// Registers an additional extrinsic function. Must be called before the
  /// first [`Host::boot`] hands a clone of the `Rc` out to a `Vm`; once a
  /// `Vm` is sharing this registry, `Rc::get_mut` can no longer get a
  /// unique view and registration panics.
  pub fn add_ext_fun(
    &mut self,
    name: impl Into<String>,
    f: impl Fn(Box<dyn ExtVal>, Box<dyn ExtVal>) -> Result<Box<dyn ExtVal>> + 'static,
  ) {
    Rc::get_mut(&mut self.extrinsics)
      .expect("add_ext_fun called after a Vm has already been booted from this host")
      .register(name, f);
  }

  /// Caches an opaque host value and returns an `ExtVal` port denoting it
  /// (spec §6.2). `serialized` is what [`Host::readback`] produces if this
  /// value survives, unread, all the way to normal form — same shape as
  /// the original's `cache(idx, 0)` extrinsic-call stand-in (see
  /// DESIGN.md).
  pub fn add_constant(&mut self, value: Box<dyn std::any::Any>, serialized: crate::ast::Tree) -> Port {
    let cached = self.cache.borrow_mut().insert(value, serialized);
    Port::ExtVal(Box::new(cached))
  }

  /// Compiles every net in `nets` and inserts it into the global table.
  /// Globals are registered as placeholders up front so mutually-recursive
  /// definitions can embed each other's identity, matching the teacher's
  /// own two-phase `insert_book` (see DESIGN.md).
  pub fn insert_nets(&mut self, nets: &Nets) -> Result<()> {
    for name in nets.keys() {
      self.defs.entry(name.clone()).or_insert_with(|| Rc::new(Global::placeholder(name.clone())));
    }

    let label_sets = encode::connect_comb_labels(nets);
    for (name, labels) in label_sets {
      self.defs[&name].set_labels(labels);
    }

    encode::encode_nets(&self.defs, nets)
  }

  /// Boots `name` with `arg` as its argument, returning a fresh [`Vm`]
  /// ready to be [`Host::execute`]d (spec §6.2). `arg` carries whatever the
  /// caller needs to read a result back out of later — see [`Vm::boot`].
  pub fn boot(&self, name: &str, arg: Port) -> Result<Vm> {
    let global = self.defs.get(name).ok_or_else(|| Error::UnknownGlobal(name.to_owned()))?;
    let mut vm = Vm::new(self.config.max_size, Rc::clone(&self.extrinsics));
    vm.boot(global, arg)?;
    Ok(vm)
  }

  pub fn execute(&self, vm: &mut Vm) -> Result<()> {
    vm.normalize()
  }

  pub fn readback(&self, vm: &Vm, root: WireId) -> Net {
    readback::read_net(&vm.heap, &self.cache.borrow(), root)
  }
}

/// Installs the `"cache"` extrinsic: given an index, re-wraps it as a
/// [`Cached`] port addressing the same slot. This is how a net serialized
/// with an unresolved cached value (an `@cache(idx 0)` tree, mirroring the
/// original's `ExtrinsicsCache.install_into`) round-trips back through
/// `parse_file` → `insert_nets` → `boot`/`execute`: calling it is a no-op
/// other than bounds-checking the index against the live cache.
fn register_cache_ext_fn(extrinsics: &mut Extrinsics, cache: Rc<RefCell<Cache>>) {
  extrinsics.register("cache", move |idx, _b| {
    let idx = match idx.as_any().downcast_ref::<Primitive>() {
      Some(Primitive::N32(n)) => n.0,
      _ => return Err(Error::Extrinsic("cache extrinsic expects an n32 index".to_owned())),
    };
    let _ = cache.borrow().value(idx);
    Ok(Box::new(Cached { idx }) as Box<dyn ExtVal>)
  });
}
