//! IO for AIGER files, in the ASCII (aag) and binary (aig) variants
//!
//! Only combinational circuits are accepted: the latch count must be zero.
//! The reader expects reencoded files, where input and And literals are
//! consecutive, as produced by the usual AIGER tooling.

use std::io::Read;

use thiserror::Error;

use crate::network::{Aig, Signal};

/// Errors raised while reading an AIGER file
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed or inconsistent header
    #[error("invalid header: {0}")]
    Header(String),
    /// Sequential circuits are rejected
    #[error("latches are not supported")]
    Latches,
    /// Malformed or semantically invalid line
    #[error("line {line}: {msg}")]
    Line {
        /// 1-based line number in the file
        line: usize,
        /// Description of the failure
        msg: String,
    },
    /// Malformed binary And section
    #[error("invalid binary and section: {0}")]
    Binary(String),
    /// File ended before all declared sections were read
    #[error("unexpected end of file")]
    Eof,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0, line: 0 }
    }

    fn next_line(&mut self) -> Result<&'a str, ParseError> {
        if self.pos >= self.data.len() {
            return Err(ParseError::Eof);
        }
        let end = self.data[self.pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|e| self.pos + e)
            .unwrap_or(self.data.len());
        let bytes = &self.data[self.pos..end];
        self.pos = if end < self.data.len() { end + 1 } else { end };
        self.line += 1;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.trim_end()),
            Err(_) => Err(ParseError::Line {
                line: self.line,
                msg: "invalid UTF-8".to_string(),
            }),
        }
    }

    fn next_byte(&mut self) -> Result<u8, ParseError> {
        if self.pos >= self.data.len() {
            return Err(ParseError::Eof);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }
}

fn parse_num(tok: &str, line: usize) -> Result<u32, ParseError> {
    tok.parse().map_err(|_| ParseError::Line {
        line,
        msg: format!("invalid number '{tok}'"),
    })
}

struct Header {
    binary: bool,
    max_var: u32,
    nb_inputs: u32,
    nb_outputs: u32,
    nb_ands: u32,
}

fn parse_header(r: &mut Reader) -> Result<Header, ParseError> {
    // Skip blank lines and comments before the header
    let l = loop {
        let l = r.next_line()?;
        if !l.is_empty() && !l.starts_with('c') {
            break l;
        }
    };
    let toks: Vec<&str> = l.split_whitespace().collect();
    if toks.len() != 6 {
        return Err(ParseError::Header(format!("expected 'aag M I L O A', got '{l}'")));
    }
    let binary = match toks[0] {
        "aag" => false,
        "aig" => true,
        other => return Err(ParseError::Header(format!("unknown magic '{other}'"))),
    };
    let max_var = parse_num(toks[1], r.line)?;
    let nb_inputs = parse_num(toks[2], r.line)?;
    let nb_latches = parse_num(toks[3], r.line)?;
    let nb_outputs = parse_num(toks[4], r.line)?;
    let nb_ands = parse_num(toks[5], r.line)?;
    if nb_latches != 0 {
        return Err(ParseError::Latches);
    }
    if max_var < nb_inputs + nb_ands {
        return Err(ParseError::Header(format!(
            "max variable index {max_var} smaller than {} declared variables",
            nb_inputs + nb_ands
        )));
    }
    Ok(Header {
        binary,
        max_var,
        nb_inputs,
        nb_outputs,
        nb_ands,
    })
}

/// 7-bit variable-length delta used by the binary And section
fn read_delta(r: &mut Reader) -> Result<u32, ParseError> {
    let mut x: u32 = 0;
    let mut shift = 0;
    loop {
        let b = r.next_byte()?;
        if shift == 28 && b & 0xf0 != 0 {
            return Err(ParseError::Binary("delta does not fit in 32 bits".to_string()));
        }
        x |= ((b & 0x7f) as u32) << shift;
        if b & 0x80 == 0 {
            return Ok(x);
        }
        shift += 7;
    }
}

fn check_and(
    lhs: u32,
    rhs0: u32,
    rhs1: u32,
    err: impl Fn(String) -> ParseError,
) -> Result<(), ParseError> {
    if rhs0 >= lhs || rhs1 >= lhs {
        return Err(err(format!(
            "gate {lhs} references a literal not defined before it"
        )));
    }
    if rhs0 == rhs1 {
        return Err(err(format!("gate {lhs} has identical children")));
    }
    Ok(())
}

/// Read a circuit in AIGER format, detecting the ASCII or binary variant
/// from the header magic
pub fn read_aiger<R: Read>(mut r: R) -> Result<Aig, ParseError> {
    let mut data = Vec::new();
    r.read_to_end(&mut data)?;
    let mut reader = Reader::new(&data);
    let header = parse_header(&mut reader)?;

    let mut aig = Aig::new();
    for _ in 0..header.nb_inputs {
        aig.add_input();
    }

    if !header.binary {
        for i in 0..header.nb_inputs {
            let l = reader.next_line()?;
            let lit = parse_num(l, reader.line)?;
            if lit != 2 * (i + 1) {
                return Err(ParseError::Line {
                    line: reader.line,
                    msg: format!("expected input literal {}, got {lit}", 2 * (i + 1)),
                });
            }
        }
    }

    // Output literals are validated once all gates are known
    let mut outputs = Vec::new();
    for _ in 0..header.nb_outputs {
        let l = reader.next_line()?;
        let lit = parse_num(l, reader.line)?;
        outputs.push((lit, reader.line));
    }

    if !header.binary {
        for j in 0..header.nb_ands {
            let l = reader.next_line()?;
            let line = reader.line;
            let toks: Vec<&str> = l.split_whitespace().collect();
            if toks.len() != 3 {
                return Err(ParseError::Line {
                    line,
                    msg: format!("expected 'lhs rhs0 rhs1', got '{l}'"),
                });
            }
            let lhs = parse_num(toks[0], line)?;
            let rhs0 = parse_num(toks[1], line)?;
            let rhs1 = parse_num(toks[2], line)?;
            if lhs != 2 * (header.nb_inputs + 1 + j) {
                return Err(ParseError::Line {
                    line,
                    msg: format!("and definitions must be consecutive even literals, got {lhs}"),
                });
            }
            check_and(lhs, rhs0, rhs1, |msg| ParseError::Line { line, msg })?;
            aig.add_and(Signal::from_raw(rhs0), Signal::from_raw(rhs1));
        }
    } else {
        if header.max_var != header.nb_inputs + header.nb_ands {
            return Err(ParseError::Header(format!(
                "binary file must have contiguous variables, max {} declared {}",
                header.max_var,
                header.nb_inputs + header.nb_ands
            )));
        }
        for j in 0..header.nb_ands {
            let lhs = 2 * (header.nb_inputs + 1 + j);
            let d0 = read_delta(&mut reader)?;
            let d1 = read_delta(&mut reader)?;
            if d0 == 0 || d0 > lhs {
                return Err(ParseError::Binary(format!("gate {lhs} has an invalid delta {d0}")));
            }
            let rhs0 = lhs - d0;
            if d1 > rhs0 {
                return Err(ParseError::Binary(format!("gate {lhs} has an invalid delta {d1}")));
            }
            let rhs1 = rhs0 - d1;
            check_and(lhs, rhs0, rhs1, ParseError::Binary)?;
            aig.add_and(Signal::from_raw(rhs0), Signal::from_raw(rhs1));
        }
    }

    let nb_vars = header.nb_inputs + header.nb_ands;
    for (lit, line) in outputs {
        if lit / 2 > nb_vars {
            return Err(ParseError::Line {
                line,
                msg: format!("output references undefined literal {lit}"),
            });
        }
        aig.add_output(Signal::from_raw(lit));
    }
    debug_assert!(aig.is_topo_sorted());
    Ok(aig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Gate;

    fn s(i: u32) -> Signal {
        Signal::from_index(i)
    }

    #[test]
    fn test_single_and() {
        let example = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";
        let aig = read_aiger(example.as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        assert_eq!(aig.nb_ands(), 1);
        assert_eq!(aig.gate(3), &Gate::And(s(1), s(2)));
        assert_eq!(aig.output(0), s(3));
    }

    #[test]
    fn test_inverted_children() {
        let example = "aag 3 2 0 1 1\n2\n4\n7\n6 3 5\n";
        let aig = read_aiger(example.as_bytes()).unwrap();
        assert_eq!(aig.gate(3), &Gate::And(!s(1), !s(2)));
        assert_eq!(aig.output(0), !s(3));
    }

    #[test]
    fn test_constant_output() {
        let aig = read_aiger("aag 0 0 0 1 0\n0\n".as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 0);
        assert_eq!(aig.output(0), Signal::zero());
    }

    #[test]
    fn test_symbol_table_ignored() {
        let example = "aag 1 1 0 1 0\n2\n2\ni0 foo\no0 bar\nc\nsome comment\n";
        let aig = read_aiger(example.as_bytes()).unwrap();
        assert_eq!(aig.nb_inputs(), 1);
        assert_eq!(aig.output(0), s(1));
    }

    #[test]
    fn test_latches_rejected() {
        let err = read_aiger("aag 2 1 1 0 0\n2\n4 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Latches));
    }

    #[test]
    fn test_bad_magic() {
        let err = read_aiger("agg 0 0 0 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Header(_)));
    }

    #[test]
    fn test_short_header() {
        let err = read_aiger("aag 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Header(_)));
    }

    #[test]
    fn test_max_var_too_small() {
        let err = read_aiger("aag 1 2 0 0 0\n2\n4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Header(_)));
    }

    #[test]
    fn test_input_literal_mismatch() {
        let err = read_aiger("aag 2 2 0 0 0\n2\n5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 3, .. }));
    }

    #[test]
    fn test_identical_children_rejected() {
        let err = read_aiger("aag 3 2 0 1 1\n2\n4\n6\n6 2 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 5, .. }));
    }

    #[test]
    fn test_undefined_reference() {
        let err = read_aiger("aag 4 2 0 1 1\n2\n4\n6\n6 8 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 5, .. }));
    }

    #[test]
    fn test_non_consecutive_and() {
        let err = read_aiger("aag 4 2 0 1 1\n2\n4\n8\n8 2 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 5, .. }));
    }

    #[test]
    fn test_undefined_output() {
        let err = read_aiger("aag 4 2 0 1 1\n2\n4\n10\n6 2 4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 4, .. }));
    }

    #[test]
    fn test_truncated() {
        let err = read_aiger("aag 3 2 0 1 1\n2\n4\n6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Eof));
    }

    #[test]
    fn test_binary_single_and() {
        // Same circuit as test_single_and, in the binary encoding:
        // lhs 6 implicit, rhs0 = 6 - 2 = 4, rhs1 = 4 - 2 = 2
        let mut bytes = b"aig 3 2 0 1 1\n6\n".to_vec();
        bytes.extend_from_slice(&[2, 2]);
        let aig = read_aiger(bytes.as_slice()).unwrap();
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.gate(3), &Gate::And(s(1), s(2)));
        assert_eq!(aig.output(0), s(3));
    }

    #[test]
    fn test_binary_multi_byte_delta() {
        let mut r = Reader::new(&[0xac, 0x02]);
        assert_eq!(read_delta(&mut r).unwrap(), 300);
        let mut r = Reader::new(&[0x7f]);
        assert_eq!(read_delta(&mut r).unwrap(), 127);
    }

    #[test]
    fn test_binary_zero_delta_rejected() {
        let mut bytes = b"aig 3 2 0 1 1\n6\n".to_vec();
        bytes.extend_from_slice(&[0, 2]);
        let err = read_aiger(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, ParseError::Binary(_)));
    }

    #[test]
    fn test_binary_truncated() {
        let bytes = b"aig 3 2 0 1 1\n6\n\x02".to_vec();
        let err = read_aiger(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, ParseError::Eof));
    }

    #[test]
    fn test_binary_gap_rejected() {
        let err = read_aiger("aig 4 2 0 0 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Header(_)));
    }
}
