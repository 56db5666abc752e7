//! Circuit satisfiability on And-Inverter Graphs
//!
//! This crate decides Boolean satisfiability of combinational circuits
//! without translating them to CNF: the CDCL search runs directly on the
//! graph, propagating over per-gate watch values, branching on the
//! justification frontier and learning OR gates from first-UIP conflict
//! analysis.
//!
//! Circuits are read from AIGER files, ASCII or binary.

#![warn(missing_docs)]

pub mod cone;
pub mod io;
pub mod network;
pub mod sim;
pub mod solver;

pub use network::{Aig, Gate, Signal};
pub use solver::{Options, Solver, Verdict};
