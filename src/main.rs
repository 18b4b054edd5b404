//! `ivmc`: a thin CLI wrapper around [`ivm::host::Host`] (spec §10).
//!
//! Boots the chosen entry point with a fixed `N32(0)` seed and drives it to
//! normal form; observable output is whatever the program's own extrinsic
//! calls write (e.g. `io_print_byte`). There is no universal calling
//! convention for reading a "return value" back out of an arbitrary net —
//! that is left to the program's own structure (see the direct-API tests in
//! `tests/end_to_end.rs`, which allocate their own sink wire for exactly
//! this reason) — so this driver does not attempt a generic readback print.

use clap::Parser;
use ivm::ast::N32;
use ivm::extrinsics::Primitive;
use ivm::host::Host;
use ivm::run::{Config, Port};
use ivm::util::parse_abbrev_number;
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about = "An interaction-net virtual machine")]
struct Cli {
  /// `.iv` source file to load.
  file: String,

  /// Name of the global to boot and reduce.
  #[arg(short = 'e', long = "entry", default_value = "::main")]
  entry_point: String,

  /// Heap size bound. Supports abbreviations such as `4G` or `400M`.
  #[arg(short = 'm', long = "memory", value_parser = parse_abbrev_number::<usize>)]
  memory: Option<usize>,

  /// Dump the interaction trace to stderr after running (requires the
  /// `trace` feature).
  #[arg(long)]
  trace: bool,
}

fn main() {
  let cli = Cli::parse();

  let nets = Host::parse_file(&cli.file).unwrap_or_else(|e| {
    eprintln!("{e}");
    process::exit(1);
  });

  let config = Config { max_size: cli.memory.unwrap_or_else(|| Config::default().max_size) };
  let mut host = Host::new(config);
  host.insert_nets(&nets).unwrap_or_else(|e| {
    eprintln!("{e}");
    process::exit(1);
  });

  let mut vm = host.boot(&cli.entry_point, Port::ExtVal(Box::new(Primitive::N32(N32(0))))).unwrap_or_else(|e| {
    eprintln!("{e}");
    process::exit(1);
  });

  #[cfg(feature = "trace")]
  let observer = if cli.trace {
    let obs = std::rc::Rc::new(ivm::trace::TraceObserver::new());
    vm.observer = Some(Box::new(RecordingObserver(obs.clone())));
    Some(obs)
  } else {
    None
  };
  #[cfg(not(feature = "trace"))]
  if cli.trace {
    eprintln!("--trace requires building with the `trace` feature");
  }

  host.execute(&mut vm).unwrap_or_else(|e| {
    eprintln!("{e}");
    process::exit(1);
  });

  #[cfg(feature = "trace")]
  if let Some(obs) = observer {
    for line in obs.history() {
      eprintln!("{line}");
    }
  }
}

#[cfg(feature = "trace")]
struct RecordingObserver(std::rc::Rc<ivm::trace::TraceObserver>);

#[cfg(feature = "trace")]
impl ivm::trace::Observer for RecordingObserver {
  fn on_start_interaction(&self, a_tag: &'static str, b_tag: &'static str, name: &'static str) {
    self.0.on_start_interaction(a_tag, b_tag, name);
  }
}
