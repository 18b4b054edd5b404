//! Stack-safe recursion for tree/graph walks whose depth tracks input size
//! (readback, encoding) rather than a fixed program structure.

/// Grows the stack by [`RED_ZONE`]/[`STACK_SIZE`] before running `f` if
/// we're close to overflowing, so deeply nested trees don't blow the stack.
/// Cheap when the red zone isn't touched: `stacker` just checks the
/// remaining stack space and calls straight through.
pub fn maybe_grow<R>(f: impl FnOnce() -> R) -> R {
  const RED_ZONE: usize = 128 * 1024;
  const STACK_SIZE: usize = 1024 * 1024;
  stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}
