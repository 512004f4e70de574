use std::cell::RefCell;
use std::rc::Rc;

/// A forward- or backward-patchable branch target.  Created at the point a control-flow word
/// (`if`, `begin`, `do`, `leave`, ...) needs to leave a placeholder cell in a word's thread; later
/// mutated in place once the jump's destination is known.
///
/// `anchor_ip` is the index of the thread cell immediately *after* the placeholder cell that
/// holds this target — matching how the indirect-threaded runtime computes a branch: by the time
/// a branch primitive runs, the inner interpreter has already advanced its instruction pointer
/// past the operand cell it just read.
pub struct BranchTarget {
    anchor_ip: usize,
    resolved: RefCell<Option<String>>,
}

/// Shared handle to a `BranchTarget`.  The same handle is held by the compile-time operand stack
/// (while the construct is still open) and by the word's thread (the placeholder cell itself), so
/// that resolving it once updates both.
pub type BranchTargetHandle = Rc<BranchTarget>;

impl BranchTarget {
    /// Create a new, unresolved target anchored at `anchor_ip`.
    pub fn new(anchor_ip: usize) -> BranchTargetHandle {
        Rc::new(BranchTarget {
            anchor_ip,
            resolved: RefCell::new(None),
        })
    }

    /// Resolve this target to `target_ip`, the index of the cell execution should jump to.
    /// Produces `"*+N"` for a forward jump or `"*-N"` for a backward one, where
    /// `N = 2 * |target_ip - anchor_ip|` (cells are 2 bytes on the target).
    pub fn resolve(&self, target_ip: usize) {
        let diff = target_ip as i64 - self.anchor_ip as i64;
        let magnitude = 2 * diff.unsigned_abs();

        assert!(magnitude > 0, "branch target resolved to its own anchor");

        let text = if diff >= 0 {
            format!("*+{}", magnitude)
        } else {
            format!("*-{}", magnitude)
        };

        *self.resolved.borrow_mut() = Some(text);
    }

    /// True once `resolve` has been called.
    pub fn is_resolved(&self) -> bool {
        self.resolved.borrow().is_some()
    }

    /// The resolved textual form of this target.  Panics if the target was never resolved —
    /// rendering an unresolved branch target is always a compiler bug, never a user-facing error.
    pub fn text(&self) -> String {
        self.resolved
            .borrow()
            .clone()
            .expect("branch target rendered before it was resolved")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_forward_jump() {
        let target = BranchTarget::new(4);
        target.resolve(8);
        assert_eq!(target.text(), "*+8");
    }

    #[test]
    fn resolves_backward_jump() {
        let target = BranchTarget::new(8);
        target.resolve(4);
        assert_eq!(target.text(), "*-8");
    }

    #[test]
    #[should_panic]
    fn rendering_unresolved_target_panics() {
        let target = BranchTarget::new(0);
        target.text();
    }
}
