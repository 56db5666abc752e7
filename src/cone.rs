//! Maximum fanout-free cone enumeration
//!
//! Diagnostics helper, not used by the search itself: given a root And gate,
//! computes the largest cone whose only external fanout is the root.

use itertools::Itertools;

use crate::network::{Aig, Gate};

/// View of the maximum fanout-free cone rooted at a gate
///
/// The cone is collected by walking fanins from the root while decrementing
/// a local copy of the fanout counts: a node whose count reaches zero has no
/// consumer outside the cone and becomes internal, any other node becomes a
/// leaf. Exceeding the node budget leaves the view empty.
pub struct MffcView<'a> {
    aig: &'a Aig,
    root: u32,
    limit: u32,
    leaves: Vec<u32>,
    inner: Vec<u32>,
    empty: bool,
}

impl<'a> MffcView<'a> {
    /// Compute the cone rooted at the given gate, within a node budget
    pub fn new(aig: &'a Aig, root: u32, limit: u32) -> MffcView<'a> {
        let mut view = MffcView {
            aig,
            root,
            limit,
            leaves: Vec::new(),
            inner: Vec::new(),
            empty: true,
        };
        view.recompute();
        view
    }

    /// Return the root gate of the view
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Return whether the traversal exceeded its budget
    pub fn empty(&self) -> bool {
        self.empty
    }

    /// Number of nodes in the cone, including the constant slot
    pub fn size(&self) -> usize {
        if self.empty {
            0
        } else {
            1 + self.leaves.len() + self.inner.len()
        }
    }

    /// Number of leaf nodes of the cone
    pub fn nb_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Number of internal gates of the cone
    pub fn nb_gates(&self) -> usize {
        self.inner.len()
    }

    /// Leaf nodes, in ascending index order
    pub fn leaves(&self) -> &[u32] {
        &self.leaves
    }

    /// Internal gates in topological order, the root last
    pub fn gates(&self) -> &[u32] {
        &self.inner
    }

    fn recompute(&mut self) {
        self.leaves.clear();
        self.inner.clear();

        let root = self.root as usize;
        if matches!(self.aig.gate(root), Gate::Zero) {
            self.empty = false;
            return;
        }
        if self.aig.gate(root).is_input() {
            self.leaves.push(self.root);
            self.empty = false;
            return;
        }

        let mut refcnt: Vec<u32> = (0..self.aig.nb_nodes())
            .map(|i| self.aig.fanout_count(i) as u32)
            .collect();
        let mut visited = Vec::new();
        if !self.collect(self.root, &mut refcnt, &mut visited) {
            return;
        }

        for n in visited.into_iter().sorted_unstable().dedup() {
            let g = self.aig.gate(n as usize);
            if matches!(g, Gate::Zero) {
                continue;
            }
            // A remaining count means fanout outside the cone
            if g.is_input() || refcnt[n as usize] > 0 {
                self.leaves.push(n);
            } else {
                self.inner.push(n);
            }
        }
        // Indices are topologically ordered by construction, so ascending
        // order is a valid schedule; the root closes the list.
        self.inner.push(self.root);
        self.empty = false;
    }

    fn collect(&self, n: u32, refcnt: &mut [u32], visited: &mut Vec<u32>) -> bool {
        let children = match self.aig.gate(n as usize).children() {
            Some(c) => c,
            None => return true,
        };
        for child in children.map(|s| s.index()) {
            visited.push(child);
            if refcnt[child as usize] > 0 {
                refcnt[child as usize] -= 1;
            }
            if refcnt[child as usize] == 0 {
                if visited.len() > self.limit as usize {
                    return false;
                }
                if !self.collect(child, refcnt, visited) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Aig;

    #[test]
    fn test_chain_cone() {
        // x = and(i0, i1); y = and(x, i2); the cone of y owns x
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let x = aig.add_and(i0, i1);
        let y = aig.add_and(x, i2);
        aig.add_output(y);

        let view = MffcView::new(&aig, y.index(), 100);
        assert!(!view.empty());
        assert_eq!(view.leaves(), &[1, 2, 3]);
        assert_eq!(view.gates(), &[x.index(), y.index()]);
        assert_eq!(view.size(), 6);
    }

    #[test]
    fn test_shared_node_is_leaf() {
        // x feeds both y and z, so the cone of y stops at x
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let x = aig.add_and(i0, i1);
        let y = aig.add_and(x, i2);
        let z = aig.add_and(x, !i2);
        aig.add_output(y);
        aig.add_output(z);

        let view = MffcView::new(&aig, y.index(), 100);
        assert_eq!(view.leaves(), &[i2.index(), x.index()]);
        assert_eq!(view.gates(), &[y.index()]);
    }

    #[test]
    fn test_input_root() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        aig.add_output(i0);
        let view = MffcView::new(&aig, i0.index(), 100);
        assert!(!view.empty());
        assert_eq!(view.nb_leaves(), 1);
        assert_eq!(view.nb_gates(), 0);
    }

    #[test]
    fn test_budget_overflow() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let mut x = aig.add_and(i0, i1);
        for _ in 0..10 {
            x = aig.add_and(x, !i0);
        }
        aig.add_output(x);

        let view = MffcView::new(&aig, x.index(), 2);
        assert!(view.empty());
        assert_eq!(view.size(), 0);
    }
}
