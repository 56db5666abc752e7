use std::fmt;

use crate::network::gate::Gate;
use crate::network::signal::Signal;

/// Representation of an And-Inverter Graph
///
/// Gates are stored in a dense vector: the constant zero at index 0, then
/// the primary inputs, then the And gates in topological order (children
/// always have a strictly smaller index than their gate). The graph is
/// immutable once built; the solver only ever reads it.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<Gate>,
    fanouts: Vec<Vec<u32>>,
    nb_inputs: usize,
    outputs: Vec<Signal>,
}

impl Aig {
    /// Create a new Aig holding only the constant zero
    pub fn new() -> Self {
        Aig {
            nodes: vec![Gate::Zero],
            fanouts: vec![Vec::new()],
            nb_inputs: 0,
            outputs: Vec::new(),
        }
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of nodes, including the constant zero
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of And gates
    pub fn nb_ands(&self) -> usize {
        self.nodes.len() - self.nb_inputs - 1
    }

    /// Get the signal of the input at index i
    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.nb_inputs());
        Signal::from_index(i as u32 + 1)
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        self.outputs[i]
    }

    /// Return the output signals
    pub fn outputs(&self) -> &[Signal] {
        &self.outputs
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.nodes[i]
    }

    /// Return the consumers of the gate at index i
    pub fn fanouts(&self, i: usize) -> &[u32] {
        &self.fanouts[i]
    }

    /// Return the number of consumers of the gate at index i
    pub fn fanout_count(&self, i: usize) -> usize {
        self.fanouts[i].len()
    }

    /// Add a new primary input
    ///
    /// Inputs must all be added before the first And gate so that they
    /// occupy a contiguous index range right after the constant.
    pub fn add_input(&mut self) -> Signal {
        assert_eq!(
            self.nodes.len(),
            self.nb_inputs + 1,
            "inputs must be added before And gates"
        );
        let i = self.nodes.len() as u32;
        self.nodes.push(Gate::Input);
        self.fanouts.push(Vec::new());
        self.nb_inputs += 1;
        Signal::from_index(i)
    }

    /// Add a two-input And gate over two existing signals
    ///
    /// The child literals must differ; children over the same index with
    /// opposite polarities are allowed. Children are kept in canonical
    /// order, smaller literal first.
    pub fn add_and(&mut self, a: Signal, b: Signal) -> Signal {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        assert_ne!(left, right, "And gate with identical children");
        let i = self.nodes.len() as u32;
        assert!(left.index() < i && right.index() < i, "undefined child");
        self.nodes.push(Gate::And(left, right));
        self.fanouts.push(Vec::new());
        self.fanouts[left.index() as usize].push(i);
        if left.index() != right.index() {
            self.fanouts[right.index() as usize].push(i);
        }
        Signal::from_index(i)
    }

    /// Add a new primary output based on an existing signal
    pub fn add_output(&mut self, l: Signal) {
        assert!((l.index() as usize) < self.nodes.len(), "undefined output");
        self.outputs.push(l)
    }

    /// Return whether every And gate has children with smaller indices
    pub fn is_topo_sorted(&self) -> bool {
        for (i, g) in self.nodes.iter().enumerate() {
            if let Gate::And(a, b) = g {
                if a.index() as usize >= i || b.index() as usize >= i {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for Aig {
    fn default() -> Self {
        Aig::new()
    }
}

impl fmt::Display for Aig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Aig with {} inputs, {} outputs, {} and gates:",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_ands()
        )?;
        for (i, g) in self.nodes.iter().enumerate() {
            if g.is_and() {
                writeln!(f, "\tx{} = {}", i, g)?;
            }
        }
        for (i, o) in self.outputs.iter().enumerate() {
            writeln!(f, "\to{} = {}", i, o)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(i0, i1);
        aig.add_output(x);

        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        assert_eq!(aig.nb_nodes(), 4);
        assert_eq!(aig.nb_ands(), 1);
        assert!(aig.is_topo_sorted());

        assert_eq!(aig.input(0), i0);
        assert_eq!(aig.input(1), i1);
        assert_eq!(aig.output(0), x);
        assert_eq!(aig.gate(x.index() as usize), &Gate::And(i0, i1));
    }

    #[test]
    fn test_canonical_order() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(i1, !i0);
        assert_eq!(aig.gate(x.index() as usize), &Gate::And(!i0, i1));
    }

    #[test]
    fn test_complementary_children() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let x = aig.add_and(i0, !i0);
        assert_eq!(aig.gate(x.index() as usize), &Gate::And(i0, !i0));
        // the shared child is recorded as a consumer only once
        assert_eq!(aig.fanout_count(i0.index() as usize), 1);
    }

    #[test]
    #[should_panic(expected = "identical children")]
    fn test_identical_children() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        aig.add_and(i0, i0);
    }

    #[test]
    fn test_fanouts() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let i2 = aig.add_input();
        let x = aig.add_and(i0, i1);
        let y = aig.add_and(i0, i2);
        let z = aig.add_and(x, !y);
        aig.add_output(z);

        assert_eq!(aig.fanout_count(i0.index() as usize), 2);
        assert_eq!(aig.fanout_count(i1.index() as usize), 1);
        assert_eq!(aig.fanout_count(x.index() as usize), 1);
        assert_eq!(aig.fanouts(i0.index() as usize), &[x.index(), y.index()]);
        assert_eq!(aig.fanout_count(z.index() as usize), 0);
    }

    #[test]
    fn test_display() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(i0, !i1);
        aig.add_output(!x);
        let s = format!("{aig}");
        assert!(s.contains("2 inputs"));
        assert!(s.contains("x3 = And(x1, !x2)"));
        assert!(s.contains("o0 = !x3"));
    }
}
