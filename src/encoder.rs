//! Batch slot encoder (spec component C5).
//!
//! Bijection between length-`n` integer vectors mod `t` and polynomials in
//! `R_t`, built from [`Config`]'s precomputed encode/decode matrices
//! (§4.5). `encode` and `decode` are matrix-vector products over `Z_t`;
//! the only design decision here is keeping them as flat `u64` matrices
//! rather than going through [`crate::rns::RnsInt`] -- slot coefficients
//! live in `Z_t` only, one machine word each, never the multi-prime RNS
//! representation ciphertext coefficients use.

use crate::backend::Modulus;
use crate::config::Config;

/// Encodes a length-`n` plaintext vector (entries in `[0, t)`) into its
/// slot-encoded polynomial `m = E . v mod t`.
pub fn encode(config: &Config, v: &[u64]) -> Vec<u64> {
    assert_eq!(v.len(), config.n(), "plaintext vector must have length n");
    matrix_vector_mul(config.encode_matrix(), v, config.t())
}

/// Decodes a slot-encoded polynomial back into its plaintext vector
/// `v = W^T . m mod t`.
pub fn decode(config: &Config, m: &[u64]) -> Vec<u64> {
    assert_eq!(m.len(), config.n(), "plaintext polynomial must have length n");
    matrix_vector_mul(config.decode_matrix(), m, config.t())
}

fn matrix_vector_mul(matrix: &[Vec<u64>], v: &[u64], t: u64) -> Vec<u64> {
    let modulus = Modulus::new(t);
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .zip(v.iter())
                .fold(0u64, |acc, (&a, &b)| modulus.add(acc, modulus.mul(a, b)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{make_config, SecretDistribution};

    fn small_config() -> Config {
        make_config(257, 60, 8, SecretDistribution::Ternary).unwrap()
    }

    #[test]
    fn encode_decode_round_trips() {
        let cfg = small_config();
        let v: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let m = encode(&cfg, &v);
        let back = decode(&cfg, &m);
        assert_eq!(back, v);
    }

    #[test]
    fn decode_encode_round_trips_over_polynomials() {
        let cfg = small_config();
        let m: Vec<u64> = vec![10, 20, 30, 40, 50, 60, 70, 80];
        let v = decode(&cfg, &m);
        let back = encode(&cfg, &v);
        assert_eq!(back, m);
    }

    #[test]
    fn slot_homomorphism_addition() {
        let cfg = small_config();
        let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let v2: Vec<u64> = vec![2, 3, 4, 5, 4, 3, 2, 3];
        let m1 = encode(&cfg, &v1);
        let m2 = encode(&cfg, &v2);
        let modulus = Modulus::new(cfg.t());
        let sum_poly: Vec<u64> = m1.iter().zip(m2.iter()).map(|(&a, &b)| modulus.add(a, b)).collect();
        let decoded_sum = decode(&cfg, &sum_poly);
        let expected: Vec<u64> = v1.iter().zip(v2.iter()).map(|(&a, &b)| modulus.add(a, b)).collect();
        assert_eq!(decoded_sum, expected);
    }
}
