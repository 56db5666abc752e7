//! Implication tables derived from the graph
//!
//! For an And gate `z = a & b`, the watch values describe the one pin
//! assignment the search must avoid: both child literals true while the
//! output is false. Everything unit propagation needs is precomputed here:
//! single-literal consequences in the direct table, and per-literal lists of
//! gates to re-examine in the indirect (watch) table.

use crate::network::{Aig, Gate};

/// Watch values and implication tables for one graph
///
/// All tables are dense vectors indexed by gate id and grow in lockstep
/// when learned gates are appended, so learned ids can be referenced
/// uniformly.
pub(crate) struct ImplicationTables {
    /// Per-gate watch values for the pins `[output, input1, input2]`
    watch: Vec<[bool; 3]>,
    /// `direct[id][value]`: assignments forced by `id` taking `value`
    direct: Vec<[Vec<(u32, bool)>; 2]>,
    /// `watched[value][id]`: gates to re-examine when `id` takes `value`
    watched: [Vec<Vec<u32>>; 2],
}

impl ImplicationTables {
    /// Build the tables for a constructed graph
    pub fn build(aig: &Aig) -> ImplicationTables {
        let n = aig.nb_nodes();
        let mut t = ImplicationTables {
            watch: vec![[false; 3]; n],
            direct: vec![[Vec::new(), Vec::new()]; n],
            watched: [vec![Vec::new(); n], vec![Vec::new(); n]],
        };
        for z in 0..n {
            let (a, b) = match aig.gate(z) {
                Gate::And(a, b) => (*a, *b),
                _ => continue,
            };
            let wa = !a.is_inverted();
            let wb = !b.is_inverted();
            t.watch[z] = [false, wa, wb];
            let z = z as u32;

            // A false child literal forces the output low; a high output
            // forces both child literals true.
            t.direct[a.index() as usize][!wa as usize].push((z, false));
            t.direct[b.index() as usize][!wb as usize].push((z, false));
            t.direct[z as usize][true as usize].push((a.index(), wa));
            t.direct[z as usize][true as usize].push((b.index(), wb));

            t.watched[wa as usize][a.index() as usize].push(z);
            t.watched[wb as usize][b.index() as usize].push(z);
            t.watched[false as usize][z as usize].push(z);
        }
        t
    }

    /// Watch triple of an And gate, `[output, input1, input2]`
    pub fn watch(&self, id: usize) -> [bool; 3] {
        self.watch[id]
    }

    /// Direct implications of `id` taking `value`
    pub fn direct(&self, id: usize, value: bool) -> &[(u32, bool)] {
        &self.direct[id][value as usize]
    }

    /// Gates watching `id` for `value`
    pub fn watched(&self, id: usize, value: bool) -> &[u32] {
        &self.watched[value as usize][id]
    }

    /// Extend every table with an empty slot for a new learned gate
    pub fn grow(&mut self) {
        self.watch.push([false; 3]);
        self.direct.push([Vec::new(), Vec::new()]);
        self.watched[0].push(Vec::new());
        self.watched[1].push(Vec::new());
    }

    /// Register a learned gate on the watch list of one of its fanins
    pub fn add_watch(&mut self, fanin: u32, value: bool, learned_id: u32) {
        self.watched[value as usize][fanin as usize].push(learned_id);
    }
}
