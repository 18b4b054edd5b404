//! Full-pipeline tests: parse, compile, boot, normalize, read back.
//!
//! Each test wires up its own sink node by hand before booting, since a
//! normal `Host::boot` call doesn't hand back anything to read from (see
//! `Vm::boot`'s doc comment) — the caller has to weave a wire of its own
//! into the boot argument first.

use std::rc::Rc;

use ivm::ast::parser::Parser;
use ivm::ast::{Tree, N32};
use ivm::extrinsics::Primitive;
use ivm::host::Host;
use ivm::run::{Config, Port, Vm};

fn load(source: &str) -> Host {
  let nets = Parser::new(source).parse_nets().unwrap();
  let mut host = Host::new(Config::default());
  host.insert_nets(&nets).unwrap();
  host
}

fn n32(v: u32) -> Port {
  Port::ExtVal(Box::new(Primitive::N32(N32(v))))
}

#[test]
fn identity_echoes_the_value_it_is_applied_to() {
  // `fn(x x)`: the two occurrences of `x` tie the wrapper's two aux wires
  // straight together, so whatever meets the second meets the first too.
  let host = load("::id { fn(x x) }");
  let global = Rc::clone(&host.defs["::id"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.link(n32(7), w.other_half());
  vm.boot(&global, Port::Comb("fn".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  let net = host.readback(&vm, w);
  assert_eq!(net.root, Tree::n32(7));
}

#[test]
fn duplicating_a_value_through_a_nilary_meets_a_comb() {
  // `pair(x y) dup(x y) = 9`: the nilary `9` meets the binary `dup` node,
  // forking the value into both of `dup`'s aux — the "copy" rule, not a
  // structural "commute" (that needs two binary nodes of different labels).
  // The root `pair(x y)` is itself what annihilates against the boot
  // wrapper, so `x` and `y` surface on two separate sink wires rather than
  // under one combined tree.
  let host = load("::main { pair(x y) dup(x y) = 9 }");
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.boot(&global, Port::Comb("pair".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_eq!(host.readback(&vm, w).root, Tree::n32(9));
  assert_eq!(host.readback(&vm, w.other_half()).root, Tree::n32(9));
}

#[test]
fn an_extrinsic_call_computes_against_a_value_supplied_at_boot() {
  // `call = @n32_add(3 out)`, with `call` and `out` both exposed through the
  // root tuple: the boot argument's first aux is the value that meets
  // `@n32_add`'s own principal (the "trigger"), its second aux is an empty
  // sink that ends up holding the sum once the call fires.
  let host = load("::main { pair(call out) call = @n32_add(3 out) }");
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.link(n32(9), w);
  vm.boot(&global, Port::Comb("pair".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  let net = host.readback(&vm, w.other_half());
  assert_eq!(net.root, Tree::n32(12));
}

#[test]
fn printing_writes_the_literal_byte_to_the_sink() {
  // `call = @io_print_byte(65 out)`: the extrinsic is called as
  // `f(arrived, stored)` (see stdlib.rs), and the call only actually fires
  // once something external reaches `call`'s own principal — so the byte to
  // print has to be the literal written in the tree (it becomes `arrived`
  // once the call completes), while the boot-supplied trigger can be any
  // value at all.
  use std::cell::RefCell;
  use std::io::{Cursor, Read, Write};

  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
  let stdout: Rc<RefCell<dyn Write>> = sink.clone();
  let stdin: Rc<RefCell<dyn Read>> = Rc::new(RefCell::new(Cursor::new(Vec::new())));
  let nets = Parser::new("::main { pair(call out) call = @io_print_byte(65 out) }").parse_nets().unwrap();
  let mut host = Host::new(Config::default()).with_io(stdout, stdin);
  host.insert_nets(&nets).unwrap();
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.link(n32(0), w);
  vm.boot(&global, Port::Comb("pair".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_eq!(&*sink.borrow(), b"A");
}

#[test]
fn a_zero_condition_takes_the_branch_ternarys_first_arm() {
  // `fn(r _) r = ?(11 22 0)`: the condition is the literal `0`, so the
  // ternary should settle on its first arm, `11` — never its second.
  let host = load("::main { fn(r _) r = ?(11 22 0) }");
  let global = Rc::clone(&host.defs["::main"]);

  // `r` and `_` are distinct aux, unlike `id`'s `fn(x x)` — both halves of
  // the boot wire start empty, and normalization alone fills them in.
  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.boot(&global, Port::Comb("fn".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_eq!(host.readback(&vm, w).root, Tree::n32(11));
}

#[test]
fn a_nonzero_condition_takes_the_branch_ternarys_second_arm() {
  let host = load("::main { fn(r _) r = ?(11 22 7) }");
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.boot(&global, Port::Comb("fn".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_eq!(host.readback(&vm, w).root, Tree::n32(22));
}

#[test]
fn an_unread_cached_constant_reads_back_as_its_serialized_form() {
  // `add_constant` hands back a `Cached` port; if it survives to normal form
  // without anything ever downcasting it, readback should produce exactly
  // the `serialized` tree it was registered with, not the live value.
  let mut host = Host::new(Config::default());
  let cached = host.add_constant(Box::new(42u32), Tree::n32(42));

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.link(cached, w);
  vm.link(Port::Erase, w.other_half());
  vm.normalize().unwrap();

  assert_eq!(host.readback(&vm, w).root, Tree::n32(42));
}

#[test]
fn the_cache_ext_fn_rematerializes_a_cached_value_by_index() {
  // `@cache(0 out)` meeting the index as its arriving trigger: the
  // extrinsic's own embedded operand (the `0` stored in the tree, the
  // `rhs`/"stored" side of spec §4.3.5's `f(arrived, stored)` convention) is
  // a placeholder, just as in the original's `ExtrinsicsCache.__call__`
  // (`readback.py`) — the index that actually selects the cache slot is the
  // value that collides with the node's principal, exactly as `add_new_val`
  // calls itself with the index on both sides.
  let mut host = Host::new(Config::default());
  let cached = host.add_constant(Box::new(7u32), Tree::n32(7));
  let idx = match &cached {
    Port::ExtVal(v) => v.as_any().downcast_ref::<ivm::extrinsics::Cached>().unwrap().idx,
    _ => unreachable!(),
  };

  let nets = Parser::new("::main { pair(call out) call = @cache(0 out) }").parse_nets().unwrap();
  host.insert_nets(&nets).unwrap();
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.link(n32(idx), w);
  vm.boot(&global, Port::Comb("pair".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_eq!(host.readback(&vm, w.other_half()).root, Tree::n32(7));
}
