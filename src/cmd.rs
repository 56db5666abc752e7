//! Command line interface

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Args, Parser, Subcommand};

use aigsat::cone::MffcView;
use aigsat::io::read_network_file;
use aigsat::network::Aig;
use aigsat::solver::{Options, Solver, Verdict};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Decide satisfiability of a circuit
    ///
    /// Prints SAT when some input assignment drives every primary output to
    /// its asserted polarity, UNSAT when no such assignment exists, and
    /// UNKNOWN when the conflict budget runs out first.
    #[clap()]
    Solve(SolveArgs),

    /// Show statistics about a circuit
    #[clap()]
    Show(ShowArgs),
}

/// Command arguments for solving
#[derive(Args)]
pub struct SolveArgs {
    /// Circuit to solve
    file: PathBuf,

    /// Print the input assignment on SAT, plus search statistics
    #[arg(long)]
    verbose: bool,

    /// Give up with UNKNOWN after this many conflicts
    #[arg(long)]
    conflict_limit: Option<u64>,

    /// Enumerate fanout-free cones with this node budget before solving
    #[arg(long)]
    limit: Option<u32>,
}

impl SolveArgs {
    pub fn run(&self) {
        let aig = read_file(&self.file);
        if self.verbose {
            println!("Processing circuit file: {}", self.file.display());
        }
        if let Some(limit) = self.limit {
            print_cones(&aig, limit);
        }
        let mut solver = Solver::new(
            &aig,
            Options {
                conflict_limit: self.conflict_limit,
            },
        );
        match solver.solve() {
            Verdict::Sat(inputs) => {
                println!("SAT");
                if self.verbose {
                    for (i, v) in inputs.iter().enumerate() {
                        println!("Input {}: {}", i, *v as u32);
                    }
                }
            }
            Verdict::Unsat => println!("UNSAT"),
            Verdict::Unknown => println!("UNKNOWN"),
        }
        if self.verbose {
            println!(
                "{} decisions, {} conflicts, {} learned gates",
                solver.nb_decisions(),
                solver.nb_conflicts(),
                solver.nb_learned()
            );
        }
    }
}

/// Command arguments for circuit statistics
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) {
        let aig = read_file(&self.file);
        println!(
            "Circuit with {} inputs, {} outputs, {} and gates",
            aig.nb_inputs(),
            aig.nb_outputs(),
            aig.nb_ands()
        );
    }
}

fn read_file(path: &Path) -> Aig {
    match read_network_file(path) {
        Ok(aig) => aig,
        Err(err) => {
            eprintln!("{}: {}", path.display(), err);
            exit(1);
        }
    }
}

fn print_cones(aig: &Aig, limit: u32) {
    for i in 0..aig.nb_nodes() {
        if !aig.gate(i).is_and() {
            continue;
        }
        let view = MffcView::new(aig, i as u32, limit);
        if view.empty() {
            println!("Cone of x{i}: over budget");
        } else {
            println!(
                "Cone of x{}: {} leaves, {} gates",
                i,
                view.nb_leaves(),
                view.nb_gates()
            );
        }
    }
}
