//! Randomness sources.
//!
//! Mirrors the shape of phantom-zone's `crate::random` traits (imported
//! throughout `src/multi_party.rs` as `RandomFillUniformInModulus` /
//! `RandomFillGaussianInModulus`): small, purpose-named traits over a
//! caller-supplied source rather than a single `rand::Rng` god-trait, so a
//! `Client` can be generic over "anything that can fill a residue slice
//! uniformly mod q" without dragging the whole `rand` API into every
//! signature. Every homomorphic operation is otherwise CPU-bound (§5); the
//! only place randomness enters is key generation and encryption.
//!
//! Two different things get sampled, and they must *not* share an
//! implementation:
//! - `A` in an RLWE sample is uniform over `[0, Q_q)`. Sampling each RNS
//!   residue independently and uniformly is exactly equivalent to this (the
//!   CRT map is a bijection, so an i.i.d. uniform residue tuple is a
//!   uniform integer in `[0, Q_q)`) -- see [`RandomFillUniformInModulus`].
//! - The secret key and the error term `E` are small *signed* integers
//!   (ternary/binary, or a narrow discrete Gaussian). These must be
//!   sampled once as plain integers and then lifted into RNS via
//!   [`crate::rns::RnsInt::construct`], which reduces the *same* integer
//!   consistently across every basis prime. Reducing independent per-prime
//!   Gaussian draws the way `A` is sampled would produce a value whose CRT
//!   reconstruction is not small at all -- see [`sample_small_gaussian`].

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::backend::Modulus;

/// Fills a buffer of residues with values drawn uniformly from `[0, modulus)`.
pub trait RandomFillUniformInModulus<Rng: ?Sized> {
    fn random_fill_uniform(rng: &mut Rng, modulus: &Modulus, out: &mut [u64]);
}

/// Marker type implementing [`RandomFillUniformInModulus`] for any
/// `rand::RngCore`. phantom-zone keeps a concrete `DefaultSecureRng`
/// (ChaCha-backed) for production and accepts any seeded RNG in tests; this
/// crate follows the same split.
pub struct StdRandomSource;

impl<R: rand::RngCore + ?Sized> RandomFillUniformInModulus<R> for StdRandomSource {
    fn random_fill_uniform(rng: &mut R, modulus: &Modulus, out: &mut [u64]) {
        let q = modulus.value();
        for slot in out.iter_mut() {
            *slot = rng.next_u64() % q;
        }
    }
}

/// Samples `count` i.i.d. centered discrete Gaussian integers with standard
/// deviation `sigma` (§4.6 step 2; default `sigma = 3.2`, design note 9).
/// Not reduced modulo anything -- the caller lifts each value into RNS with
/// [`crate::rns::RnsInt::construct`].
pub fn sample_small_gaussian(rng: &mut impl Rng, sigma: f64, count: usize) -> Vec<i64> {
    let normal = Normal::new(0.0, sigma).expect("sigma must be finite and positive");
    (0..count).map(|_| normal.sample(rng).round() as i64).collect()
}

/// Samples `count` i.i.d. ternary coefficients, uniform in `{-1, 0, 1}`
/// (§4.6, secret-key distribution).
pub fn sample_ternary(rng: &mut impl Rng, count: usize) -> Vec<i64> {
    (0..count).map(|_| (rng.gen_range(0..3) as i64) - 1).collect()
}

/// Samples `count` i.i.d. binary coefficients, uniform in `{0, 1}`.
pub fn sample_binary(rng: &mut impl Rng, count: usize) -> Vec<i64> {
    (0..count).map(|_| rng.gen_range(0..2) as i64).collect()
}

/// Default production RNG: ChaCha8, either OS-seeded or explicitly seeded
/// for reproducible tests (§5: "for tests the source is seeded
/// deterministically").
pub type DefaultSecureRng = ChaCha8Rng;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn uniform_fill_is_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let modulus = Modulus::new(97);
        let mut buf = vec![0u64; 64];
        StdRandomSource::random_fill_uniform(&mut rng, &modulus, &mut buf);
        assert!(buf.iter().all(|&x| x < 97));
    }

    #[test]
    fn gaussian_samples_stay_small() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let samples = sample_small_gaussian(&mut rng, 3.2, 256);
        // With sigma=3.2, samples should almost never be further than 50 from 0.
        assert!(samples.iter().all(|&c| c.abs() < 50));
    }

    #[test]
    fn ternary_samples_are_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let samples = sample_ternary(&mut rng, 1000);
        assert!(samples.iter().all(|&x| (-1..=1).contains(&x)));
        assert!(samples.iter().any(|&x| x == -1));
        assert!(samples.iter().any(|&x| x == 1));
    }

    #[test]
    fn binary_samples_are_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let samples = sample_binary(&mut rng, 1000);
        assert!(samples.iter().all(|&x| x == 0 || x == 1));
    }
}
