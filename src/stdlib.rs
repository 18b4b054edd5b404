//! The standard extrinsics every host ships with: `n32_*`/`f32_*` arithmetic
//! and comparisons, plus `io_*` byte-level stdio (spec §4.4, grounded on the
//! original implementation's `add_std_compat`).

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::ast::{F32, N32};
use crate::error::{Error, Result};
use crate::extrinsics::{ExtVal, Extrinsics, Primitive};

fn n32(v: Box<dyn ExtVal>) -> N32 {
  match v.as_any().downcast_ref::<Primitive>() {
    Some(Primitive::N32(n)) => *n,
    _ => panic!("extrinsic expected an n32 operand"),
  }
}

fn f32(v: Box<dyn ExtVal>) -> F32 {
  match v.as_any().downcast_ref::<Primitive>() {
    Some(Primitive::F32(f)) => *f,
    _ => panic!("extrinsic expected an f32 operand"),
  }
}

fn n32_val(n: bool) -> Box<dyn ExtVal> {
  Box::new(Primitive::N32(N32(n as u32)))
}

/// Registers the standard `n32_*`/`f32_*`/`io_*` extrinsics against
/// `extrinsics`, closing over `stdout`/`stdin` for the `io_*` family.
///
/// Every binary extrinsic is called as `f(arrived, stored)`: `arrived` is
/// the operand that completed the pair (whichever side showed up last),
/// `stored` is the one that was already waiting (spec §4.3.5). Argument
/// order in each definition below mirrors the original's exactly, so e.g.
/// `n32_sub(a, b)` computes `a - b` where `a` is `arrived`.
pub fn register(
  extrinsics: &mut Extrinsics,
  stdout: Rc<RefCell<dyn Write>>,
  stdin: Rc<RefCell<dyn Read>>,
) {
  extrinsics.register("n32_add", |a, b| Ok(Box::new(Primitive::N32(N32(n32(a).0.wrapping_add(n32(b).0))))));
  extrinsics.register("n32_sub", |a, b| Ok(Box::new(Primitive::N32(N32(n32(a).0.wrapping_sub(n32(b).0))))));
  extrinsics.register("n32_mul", |a, b| Ok(Box::new(Primitive::N32(N32(n32(a).0.wrapping_mul(n32(b).0))))));
  extrinsics.register("n32_div", |a, b| {
    let (a, b) = (n32(a).0, n32(b).0);
    if b == 0 {
      return Err(Error::Extrinsic("n32_div by zero".to_owned()));
    }
    Ok(Box::new(Primitive::N32(N32(a / b))))
  });
  extrinsics.register("n32_rem", |a, b| {
    let (a, b) = (n32(a).0, n32(b).0);
    if b == 0 {
      return Err(Error::Extrinsic("n32_rem by zero".to_owned()));
    }
    Ok(Box::new(Primitive::N32(N32(a % b))))
  });
  extrinsics.register("n32_eq", |a, b| Ok(n32_val(n32(a).0 == n32(b).0)));
  extrinsics.register("n32_ne", |a, b| Ok(n32_val(n32(a).0 != n32(b).0)));
  extrinsics.register("n32_lt", |a, b| Ok(n32_val(n32(a).0 < n32(b).0)));

  extrinsics.register("f32_add", |a, b| Ok(Box::new(Primitive::F32(F32::new(f32(a).value() + f32(b).value())))));
  extrinsics.register("f32_sub", |a, b| Ok(Box::new(Primitive::F32(F32::new(f32(a).value() - f32(b).value())))));
  extrinsics.register("f32_mul", |a, b| Ok(Box::new(Primitive::F32(F32::new(f32(a).value() * f32(b).value())))));
  extrinsics.register("f32_div", |a, b| Ok(Box::new(Primitive::F32(F32::new(f32(a).value() / f32(b).value())))));
  extrinsics.register("f32_rem", |a, b| Ok(Box::new(Primitive::F32(F32::new(f32(a).value() % f32(b).value())))));
  extrinsics.register("f32_eq", |a, b| Ok(n32_val(f32(a).value() == f32(b).value())));
  extrinsics.register("f32_ne", |a, b| Ok(n32_val(f32(a).value() != f32(b).value())));
  extrinsics.register("f32_lt", |a, b| Ok(n32_val(f32(a).value() < f32(b).value())));

  let out = Rc::clone(&stdout);
  extrinsics.register("io_print_byte", move |_io, byte| {
    let byte = n32(byte).0 as u8;
    out.borrow_mut().write_all(&[byte]).map_err(|e| Error::Extrinsic(e.to_string()))?;
    Ok(Box::new(Primitive::N32(N32(0))))
  });

  let out = Rc::clone(&stdout);
  extrinsics.register("io_flush", move |_io, _| {
    out.borrow_mut().flush().map_err(|e| Error::Extrinsic(e.to_string()))?;
    Ok(Box::new(Primitive::N32(N32(0))))
  });

  extrinsics.register("io_read_byte", move |_io, default| {
    let mut byte = [0u8; 1];
    match stdin.borrow_mut().read(&mut byte) {
      Ok(1) => Ok(Box::new(Primitive::N32(N32(byte[0] as u32)))),
      _ => Ok(Box::new(Primitive::N32(n32(default)))),
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn n32_add_adds_the_arrived_and_stored_operands() {
    let mut extrinsics = Extrinsics::default();
    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(Vec::new()));
    let stdin: Rc<RefCell<dyn Read>> = Rc::new(RefCell::new(Cursor::new(Vec::new())));
    register(&mut extrinsics, stdout, stdin);
    let f = extrinsics.ext_fns.get("n32_add").unwrap();
    let result = f(Box::new(Primitive::N32(N32(3))), Box::new(Primitive::N32(N32(4)))).unwrap();
    assert_eq!(n32(result).0, 7);
  }

  #[test]
  fn n32_sub_subtracts_stored_from_arrived() {
    let mut extrinsics = Extrinsics::default();
    let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(Vec::new()));
    let stdin: Rc<RefCell<dyn Read>> = Rc::new(RefCell::new(Cursor::new(Vec::new())));
    register(&mut extrinsics, stdout, stdin);
    let f = extrinsics.ext_fns.get("n32_sub").unwrap();
    let result = f(Box::new(Primitive::N32(N32(10))), Box::new(Primitive::N32(N32(3)))).unwrap();
    assert_eq!(n32(result).0, 7);
  }

  #[test]
  fn io_print_byte_writes_to_the_registered_sink() {
    let mut extrinsics = Extrinsics::default();
    let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let stdout: Rc<RefCell<dyn Write>> = sink.clone();
    let stdin: Rc<RefCell<dyn Read>> = Rc::new(RefCell::new(Cursor::new(Vec::new())));
    register(&mut extrinsics, stdout, stdin);
    let f = extrinsics.ext_fns.get("io_print_byte").unwrap();
    f(Box::new(Primitive::N32(N32(0))), Box::new(Primitive::N32(N32(65)))).unwrap();
    assert_eq!(&*sink.borrow(), b"A");
  }
}
