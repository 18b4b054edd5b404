//! The parser-facing structural form of a net: a root tree and a set of
//! `tree = tree` pairs (spec §3.3).

pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;

/// A 32-bit unsigned extrinsic numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct N32(pub u32);

impl fmt::Display for N32 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A 32-bit extrinsic floating-point value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct F32(pub OrderedFloat<f32>);

impl Eq for F32 {}
impl std::hash::Hash for F32 {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.0.hash(state)
  }
}

impl F32 {
  pub fn new(v: f32) -> Self {
    F32(OrderedFloat(v))
  }

  pub fn value(self) -> f32 {
    self.0.into_inner()
  }
}

impl fmt::Display for F32 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let v = self.value();
    if v.is_nan() {
      write!(f, "+NaN")
    } else if v.is_sign_negative() {
      write!(f, "{v}")
    } else {
      write!(f, "+{v}")
    }
  }
}

/// A source position, carried on parsed tree nodes for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
  pub line: usize,
  pub col_start: usize,
  pub col_end: usize,
}

/// The static syntactic form of a net node (spec §3.3).
#[derive(Debug, Clone, PartialEq)]
pub enum TreeKind {
  Erase,
  N32(N32),
  F32(F32),
  /// A variable, scoped to the enclosing net.
  Var(String),
  /// `::path` — a reference to a global definition.
  Global(String),
  Comb(String, Box<Tree>, Box<Tree>),
  ExtFn(String, Box<Tree>, Box<Tree>),
  /// Ternary on the wire; lowered to two binary `Branch` nodes by the serializer.
  Branch(Box<Tree>, Box<Tree>, Box<Tree>),
  /// `#[tree]` — survives parsing, serializes to an inert instruction.
  BlackBox(Box<Tree>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
  pub kind: TreeKind,
  pub span: Option<Span>,
}

impl Tree {
  pub fn new(kind: TreeKind, span: Option<Span>) -> Self {
    Tree { kind, span }
  }

  pub fn erase() -> Self {
    Tree::new(TreeKind::Erase, None)
  }

  pub fn var(name: impl Into<String>) -> Self {
    Tree::new(TreeKind::Var(name.into()), None)
  }

  pub fn n32(v: u32) -> Self {
    Tree::new(TreeKind::N32(N32(v)), None)
  }

  pub fn comb(label: impl Into<String>, left: Tree, right: Tree) -> Self {
    Tree::new(TreeKind::Comb(label.into(), Box::new(left), Box::new(right)), None)
  }

  /// True for trees that can carry children (used by the reader/serializer
  /// to decide whether a position needs recursive materialization).
  pub fn has_children(&self) -> bool {
    matches!(self.kind, TreeKind::Comb(..) | TreeKind::ExtFn(..) | TreeKind::Branch(..))
  }

  /// Strips any number of `BlackBox` wrappers, exposing the underlying tree.
  /// `BlackBox` is transparent to traversal and display (mirrors the
  /// original implementation's `unbox`).
  pub fn unbox(&self) -> &Tree {
    let mut t = self;
    while let TreeKind::BlackBox(inner) = &t.kind {
      t = inner;
    }
    t
  }
}

impl fmt::Display for Tree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      TreeKind::Erase => write!(f, "_"),
      TreeKind::N32(n) => write!(f, "{n}"),
      TreeKind::F32(n) => write!(f, "{n}"),
      TreeKind::Var(name) => write!(f, "{name}"),
      TreeKind::Global(name) => write!(f, "{name}"),
      TreeKind::Comb(label, a, b) => write!(f, "{label}({a} {b})"),
      TreeKind::ExtFn(label, a, b) => write!(f, "@{label}({a} {b})"),
      TreeKind::Branch(a, b, c) => write!(f, "?({a} {b} {c})"),
      TreeKind::BlackBox(inner) => write!(f, "#[{inner}]"),
    }
  }
}

impl FromStr for Tree {
  type Err = crate::error::Error;

  fn from_str(s: &str) -> crate::error::Result<Self> {
    parser::Parser::new(s).parse_tree_only()
  }
}

/// A net: a root tree and a set of `tree = tree` redex pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Net {
  pub root: Tree,
  pub pairs: Vec<(Tree, Tree)>,
}

impl fmt::Display for Net {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{ {}", self.root)?;
    for (a, b) in &self.pairs {
      write!(f, "\n  {a} = {b}")?;
    }
    write!(f, " }}")
  }
}

impl FromStr for Net {
  type Err = crate::error::Error;

  fn from_str(s: &str) -> crate::error::Result<Self> {
    parser::Parser::new(s).parse_net_only()
  }
}

/// An insertion-ordered map of global name to its net, as produced by a parse.
pub type Nets = indexmap::IndexMap<String, Net>;
