//! The search engine: trail, justification frontier, propagation and
//! first-UIP conflict analysis
//!
//! Assignments are gate values, not CNF literals. The trail records them in
//! order, grouped into decision levels; each level owns a frontier of
//! unjustified And gates from which the next decision is drawn. Propagation
//! runs the precomputed direct implications and re-examines watched gates
//! from a cursor into the trail until fixpoint or conflict.

use std::cmp::Reverse;

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::network::{Aig, Gate};
use crate::solver::tables::ImplicationTables;
use crate::solver::{Options, Verdict};

/// One decision level: its trail window, decision gate and frontier
struct Frame {
    trail_start: usize,
    decision: Option<u32>,
    j_frontier: FxHashSet<u32>,
}

/// A learned OR gate: at least one fanin must differ from its watch value
struct LearnedGate {
    fanins: Vec<u32>,
    watch: Vec<bool>,
}

/// Circuit CDCL solver over a read-only graph
///
/// A solver value answers a single `solve` call; build a fresh one for a new
/// query.
pub struct Solver<'a> {
    aig: &'a Aig,
    tables: ImplicationTables,
    options: Options,

    value: Vec<Option<bool>>,
    level: Vec<Option<u32>>,
    antecedent: Vec<Vec<u32>>,
    trail: Vec<u32>,
    qhead: usize,
    frames: Vec<Frame>,
    learned: Vec<LearnedGate>,
    conflict: Vec<u32>,

    nb_decisions: u64,
    nb_conflicts: u64,
}

impl<'a> Solver<'a> {
    /// Create a solver for a constructed graph
    pub fn new(aig: &'a Aig, options: Options) -> Solver<'a> {
        debug_assert!(aig.is_topo_sorted());
        let n = aig.nb_nodes();
        Solver {
            aig,
            tables: ImplicationTables::build(aig),
            options,
            value: vec![None; n],
            level: vec![None; n],
            antecedent: vec![Vec::new(); n],
            trail: Vec::new(),
            qhead: 0,
            frames: vec![Frame {
                trail_start: 0,
                decision: None,
                j_frontier: FxHashSet::default(),
            }],
            learned: Vec::new(),
            conflict: Vec::new(),
            nb_decisions: 0,
            nb_conflicts: 0,
        }
    }

    /// Decide satisfiability of the graph's outputs
    pub fn solve(&mut self) -> Verdict {
        if !self.seed_outputs() {
            return Verdict::Unsat;
        }
        loop {
            self.refresh_j_frontier();
            let d = match self.pick_decision() {
                Some(d) => d,
                // Every false gate is justified: unassigned inputs default to 0
                None => return Verdict::Sat(self.input_assignment()),
            };
            self.nb_decisions += 1;
            let inherited = self.frames.last().unwrap().j_frontier.clone();
            self.frames.push(Frame {
                trail_start: self.trail.len(),
                decision: Some(d),
                j_frontier: inherited,
            });
            self.assign(d, false, Vec::new());
            while !self.propagate() {
                self.nb_conflicts += 1;
                if let Some(limit) = self.options.conflict_limit {
                    if self.nb_conflicts > limit {
                        return Verdict::Unknown;
                    }
                }
                if !self.resolve_conflict() {
                    return Verdict::Unsat;
                }
            }
        }
    }

    /// Number of decisions taken so far
    pub fn nb_decisions(&self) -> u64 {
        self.nb_decisions
    }

    /// Number of conflicts resolved so far
    pub fn nb_conflicts(&self) -> u64 {
        self.nb_conflicts
    }

    /// Number of learned gates installed so far
    pub fn nb_learned(&self) -> usize {
        self.learned.len()
    }

    /// Current value of a gate
    pub fn value(&self, id: u32) -> Option<bool> {
        self.value[id as usize]
    }

    /// Decision gate of each open level, outermost first
    pub fn decisions(&self) -> Vec<u32> {
        self.frames.iter().filter_map(|f| f.decision).collect()
    }

    fn current_level(&self) -> usize {
        self.frames.len() - 1
    }

    /// Assert every primary output at level 0 and propagate
    fn seed_outputs(&mut self) -> bool {
        // The constant is permanently false
        self.assign(0, false, Vec::new());
        if !self.propagate() {
            return false;
        }
        for i in 0..self.aig.nb_outputs() {
            let lit = self.aig.output(i);
            let want = !lit.is_inverted();
            match self.value[lit.index() as usize] {
                Some(v) if v == want => (),
                Some(_) => return false,
                None => {
                    self.assign(lit.index(), want, Vec::new());
                    if !self.propagate() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Record an assignment on the trail
    ///
    /// No-op if the gate already has a value; callers check for conflicting
    /// re-assignments themselves. An And gate set to false with both inputs
    /// still free joins the current frontier.
    fn assign(&mut self, id: u32, value: bool, antecedent: Vec<u32>) {
        let idx = id as usize;
        if self.value[idx].is_some() {
            return;
        }
        debug_assert!(antecedent.iter().all(|&x| self.value[x as usize].is_some()));
        self.value[idx] = Some(value);
        self.level[idx] = Some(self.current_level() as u32);
        self.antecedent[idx] = antecedent;
        self.trail.push(id);
        if !value {
            if let Gate::And(a, b) = *self.aig.gate(idx) {
                if self.value[a.index() as usize].is_none()
                    && self.value[b.index() as usize].is_none()
                {
                    self.frames.last_mut().unwrap().j_frontier.insert(id);
                }
            }
        }
    }

    /// Drop frontier members that are justified or no longer false
    fn refresh_j_frontier(&mut self) {
        let mut frontier = std::mem::take(&mut self.frames.last_mut().unwrap().j_frontier);
        frontier.retain(|&g| {
            if self.value[g as usize] != Some(false) {
                return false;
            }
            match *self.aig.gate(g as usize) {
                Gate::And(a, b) => {
                    self.value[a.index() as usize].is_none()
                        && self.value[b.index() as usize].is_none()
                }
                _ => false,
            }
        });
        self.frames.last_mut().unwrap().j_frontier = frontier;
    }

    /// Pick the unassigned input of a frontier gate with the largest fanout,
    /// ties to the smaller id
    fn pick_decision(&self) -> Option<u32> {
        let frontier = &self.frames.last().unwrap().j_frontier;
        let mut best: Option<(usize, u32)> = None;
        for &g in frontier {
            let (a, b) = match *self.aig.gate(g as usize) {
                Gate::And(a, b) => (a, b),
                _ => continue,
            };
            for child in [a.index(), b.index()] {
                if self.value[child as usize].is_some() {
                    continue;
                }
                let fanout = self.aig.fanout_count(child as usize);
                let better = match best {
                    None => true,
                    Some((bf, bid)) => fanout > bf || (fanout == bf && child < bid),
                };
                if better {
                    best = Some((fanout, child));
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Undo every assignment above the target level
    fn backjump(&mut self, to: usize) {
        debug_assert!(to + 1 < self.frames.len());
        let keep = self.frames[to + 1].trail_start;
        while self.trail.len() > keep {
            let id = self.trail.pop().unwrap() as usize;
            self.value[id] = None;
            self.level[id] = None;
            self.antecedent[id].clear();
        }
        self.frames.truncate(to + 1);
        self.qhead = self.trail.len();
    }

    /// Run implications from the newest assignments to fixpoint
    ///
    /// Returns false on conflict, with the cause recorded.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let id = self.trail[self.qhead] as usize;
            self.qhead += 1;
            let v = self.value[id].unwrap();
            if !self.propagate_direct(id, v) || !self.propagate_watched(id, v) {
                return false;
            }
        }
        true
    }

    fn propagate_direct(&mut self, id: usize, v: bool) -> bool {
        for k in 0..self.tables.direct(id, v).len() {
            let (next, want) = self.tables.direct(id, v)[k];
            match self.value[next as usize] {
                None => {
                    let mut reason = self.antecedent[id].clone();
                    reason.push(id as u32);
                    self.assign(next, want, reason);
                }
                Some(cur) if cur == want => (),
                Some(_) => {
                    let mut cause = self.antecedent[id].clone();
                    cause.push(next);
                    self.conflict = cause;
                    return false;
                }
            }
        }
        true
    }

    fn propagate_watched(&mut self, id: usize, v: bool) -> bool {
        for k in 0..self.tables.watched(id, v).len() {
            let g = self.tables.watched(id, v)[k];
            let ok = if (g as usize) < self.aig.nb_nodes() {
                self.examine_and(g)
            } else {
                self.examine_learned(g)
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Re-examine an And gate after one of its watched pins was assigned
    fn examine_and(&mut self, g: u32) -> bool {
        let (a, b) = match *self.aig.gate(g as usize) {
            Gate::And(a, b) => (a, b),
            _ => unreachable!("only And gates are watched"),
        };
        let pins = [g, a.index(), b.index()];
        let watch = self.tables.watch(g as usize);
        let mut assigned = 0;
        let mut matched = 0;
        let mut unset = usize::MAX;
        for (i, &p) in pins.iter().enumerate() {
            match self.value[p as usize] {
                None => unset = i,
                Some(v) => {
                    assigned += 1;
                    if v == watch[i] {
                        matched += 1;
                    }
                }
            }
        }
        if assigned == 3 {
            // Fully assigned: consistent iff exactly one input escapes its
            // watch value, or only the output does
            let out_matched = self.value[g as usize] == Some(watch[0]);
            if matched == 2 || (matched == 1 && out_matched) {
                return true;
            }
            self.conflict = pins.iter().copied().sorted_unstable().dedup().collect();
            return false;
        }
        if assigned == 2 && matched == 2 {
            // Unit: the remaining pin must avoid its watch value
            let reason: Vec<u32> = pins
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != unset)
                .map(|(_, &p)| p)
                .collect();
            self.assign(pins[unset], !watch[unset], reason);
        }
        true
    }

    /// Re-examine a learned OR gate after one of its fanins was assigned
    fn examine_learned(&mut self, g: u32) -> bool {
        let li = g as usize - self.aig.nb_nodes();
        let k = self.learned[li].fanins.len();
        let mut assigned = 0;
        let mut matched = 0;
        let mut unset = usize::MAX;
        for i in 0..k {
            let f = self.learned[li].fanins[i];
            match self.value[f as usize] {
                None => unset = i,
                Some(v) => {
                    assigned += 1;
                    if v == self.learned[li].watch[i] {
                        matched += 1;
                    }
                }
            }
        }
        if matched == k {
            self.conflict = self.learned[li].fanins.clone();
            return false;
        }
        if assigned == k - 1 && matched == k - 1 {
            let f = self.learned[li].fanins[unset];
            let w = self.learned[li].watch[unset];
            let reason: Vec<u32> = self.learned[li]
                .fanins
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != unset)
                .map(|(_, &p)| p)
                .collect();
            self.assign(f, !w, reason);
        }
        true
    }

    /// Resolve the recorded conflict back to a first-UIP cut, learn it and
    /// backjump
    ///
    /// Returns false when the conflict does not depend on any decision, so
    /// the problem is unsatisfiable.
    fn resolve_conflict(&mut self) -> bool {
        let mut s: Vec<u32> = std::mem::take(&mut self.conflict)
            .into_iter()
            .sorted_unstable()
            .dedup()
            .collect();
        let cur = self.current_level() as u32;
        loop {
            s.retain(|&x| self.level[x as usize] != Some(0));
            if s.is_empty() {
                return false;
            }
            let at_cur = s
                .iter()
                .filter(|&&x| self.level[x as usize] == Some(cur))
                .count();
            if at_cur == 1 {
                break;
            }
            let target = s.iter().copied().find(|&x| {
                self.level[x as usize] == Some(cur) && !self.antecedent[x as usize].is_empty()
            });
            let t = match target {
                Some(t) => t,
                None => break,
            };
            let reason = self.antecedent[t as usize].clone();
            s.retain(|&x| x != t);
            s.extend(reason);
            s = s.into_iter().sorted_unstable().dedup().collect();
        }
        s.retain(|&x| self.level[x as usize] != Some(0));
        if s.is_empty() {
            return false;
        }
        if s.len() == 1 {
            // The single remaining value is impossible on its own
            let u = s[0];
            let flipped = !self.value[u as usize].unwrap();
            self.backjump(0);
            self.assign(u, flipped, Vec::new());
            return true;
        }
        let s: Vec<u32> = s
            .into_iter()
            .sorted_unstable_by_key(|&x| (Reverse(self.level[x as usize].unwrap()), x))
            .collect();
        let u = s[0];
        debug_assert_eq!(self.level[u as usize], Some(cur));
        let back_level = self.level[s[1] as usize].unwrap() as usize;
        debug_assert!(back_level < cur as usize);
        let flipped = !self.value[u as usize].unwrap();
        let watch: Vec<bool> = s.iter().map(|&x| self.value[x as usize].unwrap()).collect();
        self.install_learned(s.clone(), watch);
        self.backjump(back_level);
        let reason: Vec<u32> = s.iter().copied().filter(|&x| x != u).collect();
        self.assign(u, flipped, reason);
        true
    }

    /// Install a learned OR gate, permanently true at level 0
    fn install_learned(&mut self, fanins: Vec<u32>, watch: Vec<bool>) {
        let id = self.value.len() as u32;
        self.value.push(Some(true));
        self.level.push(Some(0));
        self.antecedent.push(Vec::new());
        self.tables.grow();
        for (&f, &w) in fanins.iter().zip(watch.iter()) {
            self.tables.add_watch(f, w, id);
        }
        self.learned.push(LearnedGate { fanins, watch });
    }

    fn input_assignment(&self) -> Vec<bool> {
        (0..self.aig.nb_inputs())
            .map(|i| self.value[i + 1].unwrap_or(false))
            .collect()
    }
}
