//! Compiles parsed [`Net`]s into [`Instructions`] against a set of already-
//! registered globals (spec §4.3.7/§4.3.8).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::{Net, Nets, Tree, TreeKind};
use crate::error::{Error, Result};
use crate::run::{BinaryTag, Global, Instruction, Instructions, PortTemplate};
use crate::util::maybe_grow;

/// Compiles every net in `nets` against the global identities already
/// present in `defs` (one `Global::placeholder` per name, inserted up
/// front so mutually-recursive globals can embed each other's `Rc`
/// identity before either body is compiled).
pub fn encode_nets(defs: &HashMap<String, Rc<Global>>, nets: &Nets) -> Result<()> {
  for (name, net) in nets {
    let global = &defs[name];
    let instructions = encode_net(defs, net)?;
    global.set_instructions(instructions);
  }
  Ok(())
}

fn encode_net(defs: &HashMap<String, Rc<Global>>, net: &Net) -> Result<Instructions> {
  let mut instrs = Instructions::new();
  let mut vars: HashMap<String, u32> = HashMap::new();
  encode_tree(defs, &mut instrs, &mut vars, &net.root, 0)?;
  for (a, b) in &net.pairs {
    let reg = instrs.new_register();
    encode_tree(defs, &mut instrs, &mut vars, a, reg)?;
    encode_tree(defs, &mut instrs, &mut vars, b, reg)?;
  }
  Ok(instrs)
}

fn encode_tree(
  defs: &HashMap<String, Rc<Global>>,
  instrs: &mut Instructions,
  vars: &mut HashMap<String, u32>,
  tree: &Tree,
  reg: u32,
) -> Result<()> {
  maybe_grow(|| encode_tree_inner(defs, instrs, vars, tree, reg))
}

fn encode_tree_inner(
  defs: &HashMap<String, Rc<Global>>,
  instrs: &mut Instructions,
  vars: &mut HashMap<String, u32>,
  tree: &Tree,
  reg: u32,
) -> Result<()> {
  match &tree.kind {
    TreeKind::Erase => {
      instrs.push(Instruction::Nilary { to: reg, port: PortTemplate::Erase, span: tree.span });
    }
    TreeKind::N32(n) => {
      instrs.push(Instruction::Nilary { to: reg, port: PortTemplate::N32(*n), span: tree.span });
    }
    TreeKind::F32(n) => {
      instrs.push(Instruction::Nilary { to: reg, port: PortTemplate::F32(*n), span: tree.span });
    }
    TreeKind::Global(name) => {
      let g = defs.get(name).ok_or_else(|| Error::UnknownGlobal(name.clone()))?;
      instrs.push(Instruction::Nilary {
        to: reg,
        port: PortTemplate::GlobalRef(Rc::clone(g)),
        span: tree.span,
      });
    }
    TreeKind::Var(name) => match vars.get(name) {
      // First occurrence: nothing to emit yet, just remember where this
      // variable's wire lives. A var that's never referenced a second time
      // simply leaves `reg` unconnected from this side, same as the source
      // net leaving a loose end.
      None => {
        vars.insert(name.clone(), reg);
      }
      // Second (or later) occurrence: tie this register back to the first
      // one. Not a black box, so it leaves no trace in introspection.
      Some(&first) => {
        instrs.push(Instruction::Inert { to: reg, from: first, opaque: false });
      }
    },
    TreeKind::Comb(label, a, b) => {
      let ra = instrs.new_register();
      let rb = instrs.new_register();
      instrs.push(Instruction::Binary {
        tag: BinaryTag::Comb,
        label: label.clone(),
        to: reg,
        a: ra,
        b: rb,
        span: tree.span,
      });
      encode_tree(defs, instrs, vars, a, ra)?;
      encode_tree(defs, instrs, vars, b, rb)?;
    }
    TreeKind::ExtFn(label, a, b) => {
      let ra = instrs.new_register();
      let rb = instrs.new_register();
      instrs.push(Instruction::Binary {
        tag: BinaryTag::ExtFn,
        label: label.clone(),
        to: reg,
        a: ra,
        b: rb,
        span: tree.span,
      });
      encode_tree(defs, instrs, vars, a, ra)?;
      encode_tree(defs, instrs, vars, b, rb)?;
    }
    // A ternary lowers to two nested Branch binary nodes, not one: an inner
    // node carrying the two arms as its aux pair, and an outer node whose
    // OWN principal is the condition's register, not `reg` — `branch()`
    // only ever fires when an ExtVal collides with a Branch's principal, so
    // the condition has to be the thing that node's construction places
    // its `to` register against, with `reg` (the tree's real output)
    // riding along as its second aux instead. The condition and arms are
    // encoded before the nodes that consume them for the same reason a
    // fresh register never wins a redex against one already holding a
    // value: a node's own `to` is placed by plain `link`, which does form a
    // redex against whatever's already sitting in that register, so the
    // literal/computed condition has to already be there when the outer
    // node's instruction runs (spec §3.3, §4.3.6; see DESIGN.md).
    TreeKind::Branch(then, els, cond) => {
      let inner = instrs.new_register();
      let ra = instrs.new_register();
      let rb = instrs.new_register();
      encode_tree(defs, instrs, vars, then, ra)?;
      encode_tree(defs, instrs, vars, els, rb)?;
      instrs.push(Instruction::Binary {
        tag: BinaryTag::Branch,
        label: String::new(),
        to: inner,
        a: ra,
        b: rb,
        span: tree.span,
      });
      let rc = instrs.new_register();
      encode_tree(defs, instrs, vars, cond, rc)?;
      instrs.push(Instruction::Binary {
        tag: BinaryTag::Branch,
        label: String::new(),
        to: rc,
        a: inner,
        b: reg,
        span: tree.span,
      });
    }
    TreeKind::BlackBox(inner) => {
      let r_inner = instrs.new_register();
      instrs.push(Instruction::Inert { to: reg, from: r_inner, opaque: true });
      encode_tree(defs, instrs, vars, inner, r_inner)?;
    }
  }
  Ok(())
}

/// The label-set closure of every global in `defs`: every label a call to
/// `name` can ever introduce, transitively through any global it in turn
/// calls (spec §3.5/§4.3.8). Computed by fixpoint iteration over the
/// static call graph implied by `nets` rather than over compiled
/// instructions, so it can run before `encode_nets` (mirrors the two-phase
/// insertion `examples/NaoEhSavio-HVM2/src/host.rs` performs for its own
/// label sets).
pub fn connect_comb_labels(nets: &Nets) -> HashMap<String, HashSet<String>> {
  let mut labels: HashMap<String, HashSet<String>> = HashMap::new();
  let mut calls: HashMap<String, HashSet<String>> = HashMap::new();

  for (name, net) in nets {
    let mut own = HashSet::new();
    let mut called = HashSet::new();
    collect_tree_labels(&net.root, &mut own, &mut called);
    for (a, b) in &net.pairs {
      collect_tree_labels(a, &mut own, &mut called);
      collect_tree_labels(b, &mut own, &mut called);
    }
    labels.insert(name.clone(), own);
    calls.insert(name.clone(), called);
  }

  loop {
    let mut changed = false;
    let names: Vec<String> = labels.keys().cloned().collect();
    for name in names {
      let callees = calls.get(&name).cloned().unwrap_or_default();
      let mut union = labels[&name].clone();
      for callee in &callees {
        if let Some(callee_labels) = labels.get(callee) {
          for l in callee_labels {
            if union.insert(l.clone()) {
              changed = true;
            }
          }
        }
      }
      labels.insert(name, union);
    }
    if !changed {
      break;
    }
  }
  labels
}

fn collect_tree_labels(tree: &Tree, own: &mut HashSet<String>, called: &mut HashSet<String>) {
  match &tree.kind {
    TreeKind::Erase | TreeKind::N32(_) | TreeKind::F32(_) | TreeKind::Var(_) => {}
    TreeKind::Global(name) => {
      called.insert(name.clone());
    }
    TreeKind::Comb(label, a, b) => {
      own.insert(label.clone());
      collect_tree_labels(a, own, called);
      collect_tree_labels(b, own, called);
    }
    TreeKind::ExtFn(_, a, b) => {
      collect_tree_labels(a, own, called);
      collect_tree_labels(b, own, called);
    }
    TreeKind::Branch(a, b, c) => {
      collect_tree_labels(a, own, called);
      collect_tree_labels(b, own, called);
      collect_tree_labels(c, own, called);
    }
    TreeKind::BlackBox(inner) => collect_tree_labels(inner, own, called),
  }
}
