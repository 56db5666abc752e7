//! Reading circuits from AIGER files

mod aiger;

use std::fs::File;
use std::path::Path;

pub use aiger::{read_aiger, ParseError};

use crate::network::Aig;

/// Parse a circuit from an AIGER file, ASCII or binary
///
/// The format is detected from the header magic, not the file extension.
pub fn read_network_file(path: &Path) -> Result<Aig, ParseError> {
    let f = File::open(path)?;
    read_aiger(f)
}
