//! Number-theory primitives (spec component C1).
//!
//! Arbitrary-precision throughout: basis products and CRT reconstructions
//! routinely exceed a machine word by orders of magnitude once the
//! ciphertext modulus reaches a few hundred bits (§4.4 of the spec builds
//! `Q_q` to an arbitrary `q_bits`). Backed by `num-bigint-dig`, the same
//! crate phantom-zone depends on for its own primality testing.

use num_bigint_dig::{prime, BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Miller–Rabin primality test (`num_bigint_dig`'s implementation, ported
/// from Go's `crypto/rand`). 20 rounds gives a false-positive probability
/// below `4^-20`, comfortably below anything this crate's basis-selection
/// loop needs.
pub fn is_prime(x: &BigUint) -> bool {
    prime::probably_prime(x, 20)
}

/// Smallest primitive root of the multiplicative group `(Z/pZ)*` for prime
/// `p`. Factors `p - 1` by trial division, which is fine for the
/// residue-bounded primes (`<= 2^32`) this crate's RNS bases are built from.
pub fn primitive_root(p: &BigUint) -> BigUint {
    assert!(is_prime(p), "primitive_root requires a prime modulus");
    let one = BigUint::one();
    let p_minus_one = p - &one;
    let factors = prime_factors(&p_minus_one);

    let mut candidate = BigUint::from(2u32);
    loop {
        let is_generator = factors.iter().all(|f| {
            let exp = &p_minus_one / f;
            candidate.modpow(&exp, p) != one
        });
        if is_generator {
            return candidate;
        }
        candidate += 1u32;
    }
}

/// Distinct prime factors of `n` by trial division.
fn prime_factors(n: &BigUint) -> Vec<BigUint> {
    let mut factors = Vec::new();
    let mut remaining = n.clone();
    let mut d = BigUint::from(2u32);
    while &d * &d <= remaining {
        if (&remaining % &d).is_zero() {
            factors.push(d.clone());
            while (&remaining % &d).is_zero() {
                remaining /= &d;
            }
        }
        d += 1u32;
    }
    if remaining > BigUint::one() {
        factors.push(remaining);
    }
    factors
}

/// Modular inverse of `a` mod `m`, via the extended Euclidean algorithm.
/// `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    if m.is_zero() {
        return None;
    }
    let ext = a.extended_gcd(m);
    if ext.gcd != BigInt::one() && ext.gcd != -BigInt::one() {
        return None;
    }
    let inv = ext.x * ext.gcd.signum();
    Some(inv.mod_floor(m))
}

/// Reconstruct the unique integer represented by `residues` modulo the
/// pairwise-coprime `moduli`, via iterated two-modulus CRT combination.
///
/// When `symmetric` is set, the result is centered into
/// `(-prod(moduli)/2, prod(moduli)/2]` rather than returned in `[0, prod)`.
pub fn crt_reconstruct(residues: &[BigInt], moduli: &[BigInt], symmetric: bool) -> BigInt {
    assert_eq!(residues.len(), moduli.len(), "residues/moduli length mismatch");
    assert!(!moduli.is_empty(), "crt_reconstruct requires a non-empty basis");

    let mut acc_residue = residues[0].mod_floor(&moduli[0]);
    let mut acc_modulus = moduli[0].clone();

    for (r, m) in residues.iter().zip(moduli.iter()).skip(1) {
        let inv = mod_inverse(&acc_modulus, m)
            .expect("CRT combination requires pairwise-coprime moduli");
        // Garner's formula: x = acc_residue + acc_modulus * (((r - acc_residue) * inv) mod m)
        let diff = (r - &acc_residue).mod_floor(m);
        let k = (diff * inv).mod_floor(m);
        acc_residue += &acc_modulus * k;
        acc_modulus *= m;
        acc_residue = acc_residue.mod_floor(&acc_modulus);
    }

    if symmetric {
        let half = &acc_modulus >> 1u32;
        if acc_residue > half {
            acc_residue -= &acc_modulus;
        }
    }
    acc_residue
}

/// Smallest prime `p >= start` with `p % twice_n == 1`, required no larger
/// than `bound`. NTT-friendly primes of this shape are what both
/// phantom-zone's basis generation and the Python reference
/// (`original_source/pymodel/ntt_friendly_prime.py`) search for when
/// building an RNS basis.
pub fn next_ntt_friendly_prime(start: u64, twice_n: u64, bound: u64) -> Option<u64> {
    let mut candidate = if start % twice_n == 1 {
        start
    } else {
        start + (twice_n - start % twice_n) + 1
    };
    while candidate <= bound {
        let big = BigUint::from(candidate);
        if is_prime(&big) {
            return Some(candidate);
        }
        candidate += twice_n;
    }
    None
}

/// Convenience: cast a non-negative `BigInt` to `BigUint`.
pub fn to_biguint(x: &BigInt) -> BigUint {
    x.to_biguint()
        .expect("to_biguint requires a non-negative integer")
}

/// `x mod m`, reduced down to a `u64`. Used wherever a big CRT coefficient
/// (already known to be `< 2^64` once reduced mod a single residue-bounded
/// prime) needs to become a plain residue -- e.g. reducing `alpha_i` onto
/// each prime of `q` when building the relinearization key.
pub fn biguint_to_u64_mod(x: &BigUint, m: u64) -> u64 {
    let r = x % m;
    let bytes = r.to_bytes_le();
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primality() {
        assert!(is_prime(&BigUint::from(257u32)));
        assert!(!is_prime(&BigUint::from(256u32)));
        assert!(is_prime(&BigUint::from(2u32)));
    }

    #[test]
    fn finds_a_generator() {
        // Z/257Z* has order 256 = 2^8; any quadratic non-residue generates it.
        let p = BigUint::from(257u32);
        let g = primitive_root(&p);
        let order = &p - BigUint::one();
        // g^(order/2) must not be 1 for g to be a generator of a group of
        // order a power of two.
        assert_ne!(g.modpow(&(&order / 2u32), &p), BigUint::one());
    }

    #[test]
    fn inverse_round_trips() {
        let a = BigInt::from(5);
        let m = BigInt::from(17);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!((a * inv).mod_floor(&m), BigInt::one());
    }

    #[test]
    fn crt_matches_direct_reduction() {
        let moduli: Vec<BigInt> = vec![BigInt::from(5), BigInt::from(7), BigInt::from(11)];
        let x = BigInt::from(173);
        let residues: Vec<BigInt> = moduli.iter().map(|m| x.mod_floor(m)).collect();
        let reconstructed = crt_reconstruct(&residues, &moduli, false);
        assert_eq!(reconstructed, x.mod_floor(&(5 * 7 * 11).into()));
    }

    #[test]
    fn crt_symmetric_centers() {
        let moduli: Vec<BigInt> = vec![BigInt::from(5), BigInt::from(7)];
        // -3 mod 35 == 32
        let residues: Vec<BigInt> = vec![BigInt::from(2), BigInt::from(4)];
        let reconstructed = crt_reconstruct(&residues, &moduli, true);
        assert_eq!(reconstructed, BigInt::from(-3));
    }

    #[test]
    fn ntt_friendly_search() {
        // 2n = 16; 17 is the smallest prime == 1 mod 16.
        let p = next_ntt_friendly_prime(2, 16, 1000).unwrap();
        assert_eq!(p, 17);
        assert_eq!(p % 16, 1);
    }
}
