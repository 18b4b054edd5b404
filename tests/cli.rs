//! Tests the `ivmc` binary, including its CLI interface (spec §10).

use std::error::Error;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::rc::Rc;

use insta::assert_display_snapshot;
use ivm::ast::parser::Parser;
use ivm::ast::N32;
use ivm::extrinsics::Primitive;
use ivm::host::Host;
use ivm::run::{Config, Port, Vm};

fn fixture_path(name: &str) -> String {
  env!("CARGO_MANIFEST_DIR").to_owned() + "/tests/fixtures/" + name
}

fn execute_ivmc(args: &[&str]) -> Result<(ExitStatus, String), Box<dyn Error>> {
  let mut child =
    Command::new(env!("CARGO_BIN_EXE_ivmc")).args(args).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

  let mut stdout = child.stdout.take().ok_or("Couldn't capture stdout!")?;
  let mut stderr = child.stderr.take().ok_or("Couldn't capture stderr!")?;

  let status = child.wait()?;

  let mut output = String::new();
  stdout.read_to_string(&mut output)?;
  stderr.read_to_string(&mut output)?;

  Ok((status, output))
}

#[test]
fn test_cli_prints_through_the_default_entry_point() {
  // `::main` is booted with the CLI's fixed `N32(0)` seed; the fixture's
  // single `@io_print_byte(72 _)` fires off that seed and writes `H`.
  let hello = fixture_path("hello.iv");
  let (status, output) = execute_ivmc(&[&hello]).unwrap();
  assert!(status.success());
  assert_display_snapshot!(output, @"H");
}

#[test]
fn test_cli_prints_through_a_selected_entry_point() {
  let hello = fixture_path("hello.iv");
  let (status, output) = execute_ivmc(&["-e", "::greet", &hello]).unwrap();
  assert!(status.success());
  assert_display_snapshot!(output, @"G");
}

#[test]
fn test_cli_errors() {
  let (status, output) = execute_ivmc(&["this-file-does-not-exist.iv"]).unwrap();
  assert!(!status.success());
  assert_display_snapshot!(output, @r###"input file "this-file-does-not-exist.iv" not found"###);

  let hello = fixture_path("hello.iv");
  let (status, output) = execute_ivmc(&["-e", "::nope", &hello]).unwrap();
  assert!(!status.success());
  assert_display_snapshot!(output, @r###"unknown global "::nope""###);
}

fn n32(v: u32) -> Port {
  Port::ExtVal(Box::new(Primitive::N32(N32(v))))
}

fn readback_net(source: &str, seed: Option<Port>) -> ivm::ast::Net {
  let nets = Parser::new(source).parse_nets().unwrap();
  let mut host = Host::new(Config::default());
  host.insert_nets(&nets).unwrap();
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  if let Some(seed) = seed {
    vm.link(seed, w.other_half());
  }
  vm.boot(&global, Port::Comb("fn".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  host.readback(&vm, w)
}

#[test]
fn test_readback_identity() {
  assert_display_snapshot!(readback_net("::main { fn(x x) }", Some(n32(7))), @"{ 7 }");
}

#[test]
fn test_readback_branch_first_arm() {
  assert_display_snapshot!(readback_net("::main { fn(r _) r = ?(11 22 0) }", None), @"{ 11 }");
}

#[test]
fn test_readback_branch_second_arm() {
  assert_display_snapshot!(readback_net("::main { fn(r _) r = ?(11 22 7) }", None), @"{ 22 }");
}

#[test]
fn test_readback_copy_through_a_nilary_meets_a_comb() {
  let nets = Parser::new("::main { pair(x y) dup(x y) = 9 }").parse_nets().unwrap();
  let mut host = Host::new(Config::default());
  host.insert_nets(&nets).unwrap();
  let global = Rc::clone(&host.defs["::main"]);

  let mut vm = Vm::new(host.config.max_size, Rc::clone(&host.extrinsics));
  let w = vm.heap.alloc_node().unwrap();
  vm.boot(&global, Port::Comb("pair".to_owned(), w)).unwrap();
  vm.normalize().unwrap();

  assert_display_snapshot!(host.readback(&vm, w), @"{ 9 }");
  assert_display_snapshot!(host.readback(&vm, w.other_half()), @"{ 9 }");
}
