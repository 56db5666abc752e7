//! Evaluation of a circuit under complete input assignments
//!
//! This is the reference semantics the solver is checked against: a
//! topological sweep computing every gate value from the inputs.

use rand::{Rng, SeedableRng};

use crate::network::{Aig, Gate, Signal};

/// Evaluate every primary output under a complete input assignment
pub fn simulate(aig: &Aig, inputs: &[bool]) -> Vec<bool> {
    assert_eq!(inputs.len(), aig.nb_inputs());
    debug_assert!(aig.is_topo_sorted());
    let mut values = vec![false; aig.nb_nodes()];
    for i in 0..aig.nb_nodes() {
        let v = match aig.gate(i) {
            Gate::Zero => false,
            Gate::Input => inputs[i - 1],
            Gate::And(a, b) => signal_value(&values, *a) && signal_value(&values, *b),
        };
        values[i] = v;
    }
    aig.outputs()
        .iter()
        .map(|o| signal_value(&values, *o))
        .collect()
}

/// Return whether an assignment drives every output to its asserted polarity
pub fn check_witness(aig: &Aig, inputs: &[bool]) -> bool {
    simulate(aig, inputs).iter().all(|v| *v)
}

fn signal_value(values: &[bool], s: Signal) -> bool {
    values[s.index() as usize] ^ s.is_inverted()
}

/// Generate random input patterns with a given seed
pub fn generate_random_patterns(
    nb_inputs: usize,
    nb_patterns: usize,
    seed: u64,
) -> Vec<Vec<bool>> {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    let mut ret = Vec::new();
    for _ in 0..nb_patterns {
        ret.push((0..nb_inputs).map(|_| rng.gen()).collect());
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Aig;

    #[test]
    fn test_simulate_and() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(i0, i1);
        aig.add_output(x);
        aig.add_output(!x);

        assert_eq!(simulate(&aig, &[true, true]), vec![true, false]);
        assert_eq!(simulate(&aig, &[true, false]), vec![false, true]);
        assert_eq!(simulate(&aig, &[false, true]), vec![false, true]);
    }

    #[test]
    fn test_simulate_constants() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let x = aig.add_and(i0, Signal::one());
        aig.add_output(x);
        aig.add_output(Signal::zero());
        assert_eq!(simulate(&aig, &[true]), vec![true, false]);
        assert_eq!(simulate(&aig, &[false]), vec![false, false]);
    }

    #[test]
    fn test_simulate_deep() {
        // or(i0, i1) = !(and(!i0, !i1))
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(!i0, !i1);
        aig.add_output(!x);
        assert_eq!(simulate(&aig, &[false, false]), vec![false]);
        assert_eq!(simulate(&aig, &[true, false]), vec![true]);
        assert_eq!(simulate(&aig, &[false, true]), vec![true]);
    }

    #[test]
    fn test_check_witness() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let x = aig.add_and(i0, !i1);
        aig.add_output(x);
        assert!(check_witness(&aig, &[true, false]));
        assert!(!check_witness(&aig, &[true, true]));
    }

    #[test]
    fn test_random_patterns_deterministic() {
        let a = generate_random_patterns(8, 16, 42);
        let b = generate_random_patterns(8, 16, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.iter().all(|p| p.len() == 8));
    }
}
