//! Read-only tracing hooks (spec §4.5). The trait is always compiled so a
//! host can install an observer regardless of build configuration; the
//! concrete recorder that actually remembers anything is gated behind the
//! `trace` feature.

/// Notified as the VM interacts ports and links wires. Every method has a
/// no-op default so an observer only needs to implement the hooks it cares
/// about.
pub trait Observer {
  fn on_start_interaction(&self, _a_tag: &'static str, _b_tag: &'static str, _name: &'static str) {}
  fn on_complete_interaction(&self) {}
  fn on_link(&self, _a_tag: &'static str, _b_tag: &'static str) {}
  fn on_link_wire(&self) {}
  fn on_free_wire(&self) {}
}

#[cfg(feature = "trace")]
pub use recorder::TraceObserver;

#[cfg(feature = "trace")]
mod recorder {
  use super::Observer;
  use std::cell::RefCell;

  /// Records a cheap, `Debug`-string summary of each interaction — not a
  /// full tree readback, since the hooks fire without access to the live
  /// heap needed to reconstruct one.
  #[derive(Default)]
  pub struct TraceObserver {
    log: RefCell<Vec<String>>,
  }

  impl TraceObserver {
    pub fn new() -> Self {
      TraceObserver::default()
    }

    pub fn history(&self) -> Vec<String> {
      self.log.borrow().clone()
    }
  }

  impl Observer for TraceObserver {
    fn on_start_interaction(&self, a_tag: &'static str, b_tag: &'static str, name: &'static str) {
      self.log.borrow_mut().push(format!("{name}: {a_tag} ~ {b_tag}"));
    }
  }

  #[cfg(test)]
  mod tests {
    use super::*;

    #[test]
    fn records_interaction_tag_pairs_with_rule_name() {
      let obs = TraceObserver::new();
      obs.on_start_interaction("comb", "comb", "annihilate");
      assert_eq!(obs.history(), vec!["annihilate: comb ~ comb".to_owned()]);
    }
  }
}
