//! Circuit-based CDCL satisfiability engine
//!
//! The solver works directly on the And-Inverter Graph, without a CNF
//! translation: unit propagation runs over per-gate watch values, decisions
//! are drawn from the justification frontier, and conflicts are resolved by
//! first-UIP analysis into learned OR gates.

mod search;
mod tables;

pub use search::Solver;

/// Outcome of a solve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A primary-input assignment driving every output to its asserted
    /// polarity, indexed by input
    Sat(Vec<bool>),
    /// No such assignment exists
    Unsat,
    /// The conflict budget was exhausted before an answer was found
    Unknown,
}

impl Verdict {
    /// Returns true for a satisfiable verdict
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat(_))
    }
}

/// Search tuning knobs
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Give up with [`Verdict::Unknown`] after this many conflicts
    pub conflict_limit: Option<u64>,
}
