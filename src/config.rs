//! Parameter / configuration (spec component C4).
//!
//! `Config` owns every table the rest of the crate shares read-only for the
//! lifetime of the scheme (§3 "Ownership"): the three RNS bases `q`, `B`,
//! `B_a`, the CRT coefficients `alpha_i`, the scaling factor `Delta`, and
//! the batch-encoder's Vandermonde matrices. Building it is the BEHZ
//! parameter-selection recipe of §4.4, run once by [`make_config`].

use num_bigint_dig::{BigInt, BigUint};
use num_traits::One;
use tracing::debug;

use crate::backend::Modulus;
use crate::error::ConfigError;
use crate::numeric::{is_prime, mod_inverse, next_ntt_friendly_prime, primitive_root, to_biguint};
use crate::rns::{biguint_to_u64, RnsBasis};

/// Secret-key coefficient distribution (§4.6 "key gen").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretDistribution {
    /// Coefficients uniform in `{-1, 0, 1}`.
    Ternary,
    /// Coefficients uniform in `{0, 1}`.
    Binary,
}

/// The upper bound every RNS basis prime in this scheme is kept under.
/// `2^32` residues keep `u64` products (`<= 2^64`) exact through every
/// `ArithmeticOps` reduction in [`crate::backend`].
pub const DEFAULT_RESIDUE_BOUND: u64 = 1 << 32;

/// Standard-deviation default for the discrete Gaussian error distribution
/// (§4.6, design note: "sigma = 3.2 is a standard default").
pub const DEFAULT_SIGMA: f64 = 3.2;

#[derive(Clone, Debug)]
pub struct Config {
    t: u64,
    n: usize,
    secret_distribution: SecretDistribution,
    sigma: f64,

    q: RnsBasis,
    b: RnsBasis,
    b_a: RnsBasis,

    /// CRT coefficients `alpha_i = (Q_q/q_i) * inv(Q_q/q_i mod q_i) mod Q_q`,
    /// one per prime of `q` (§3 "Evaluation (relinearization) key").
    alpha: Vec<BigUint>,
    /// `Delta = Q_q / t`.
    delta: BigUint,
    /// `Q = Q_q * Delta`, used to size `B` so coefficient growth during
    /// ring multiplication cannot overflow the extended basis (§4.4 step 3).
    q_big: BigUint,

    /// Batch encoder's encode matrix `E` (inverse of `decode_matrix` in
    /// `Z_t`), row-major, `n x n`.
    encode_matrix: Vec<Vec<u64>>,
    /// Batch encoder's decode matrix `W^T` (Vandermonde of the `2n`-th
    /// roots of unity), row-major, `n x n`.
    decode_matrix: Vec<Vec<u64>>,
}

impl Config {
    pub fn t(&self) -> u64 {
        self.t
    }
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn secret_distribution(&self) -> SecretDistribution {
        self.secret_distribution
    }
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
    pub fn q(&self) -> &RnsBasis {
        &self.q
    }
    pub fn b(&self) -> &RnsBasis {
        &self.b
    }
    pub fn b_a(&self) -> &RnsBasis {
        &self.b_a
    }
    pub fn alpha(&self) -> &[BigUint] {
        &self.alpha
    }
    pub fn delta(&self) -> &BigUint {
        &self.delta
    }
    pub fn q_big(&self) -> &BigUint {
        &self.q_big
    }
    pub fn q_q(&self) -> BigUint {
        self.q.product()
    }
    pub fn encode_matrix(&self) -> &[Vec<u64>] {
        &self.encode_matrix
    }
    pub fn decode_matrix(&self) -> &[Vec<u64>] {
        &self.decode_matrix
    }

    /// Human-readable parameter summary, used by tests and `tracing` debug
    /// logs rather than printed to a user-facing surface (verbose parameter
    /// printing is explicitly out of scope, §1) -- the one supplemental
    /// surface pulled from `original_source/pymodel/BFV_config.py`'s
    /// parameter dump, narrowed to a debug string (see SPEC_FULL.md).
    pub fn describe(&self) -> String {
        format!(
            "t={}, n={}, |q|={} primes ({} bits), |B|={} primes, |B_a|={} prime, dist={:?}",
            self.t,
            self.n,
            self.q.len(),
            self.q_q().bits(),
            self.b.len(),
            self.b_a.len(),
            self.secret_distribution,
        )
    }
}

/// Build a `Config` per §4.4's six construction steps, with the ambient
/// defaults of [`DEFAULT_RESIDUE_BOUND`] and [`DEFAULT_SIGMA`].
pub fn make_config(
    t: u64,
    q_bits: u32,
    n: usize,
    secret_distribution: SecretDistribution,
) -> Result<Config, ConfigError> {
    make_config_with(t, q_bits, n, secret_distribution, DEFAULT_RESIDUE_BOUND, DEFAULT_SIGMA)
}

/// As [`make_config`], but with an explicit residue bound -- the knob §7
/// class 2 says callers should retry with when `B_a` cannot be placed in a
/// single prime.
pub fn make_config_with(
    t: u64,
    q_bits: u32,
    n: usize,
    secret_distribution: SecretDistribution,
    residue_bound: u64,
    sigma: f64,
) -> Result<Config, ConfigError> {
    if !is_prime(&BigUint::from(t)) {
        return Err(ConfigError::PlaintextModulusNotPrime(t));
    }
    if !n.is_power_of_two() {
        return Err(ConfigError::RingDegreeNotPowerOfTwo(n));
    }
    let twice_n = 2 * n as u64;
    if (t - 1) % twice_n != 0 {
        return Err(ConfigError::NoRootOfUnity { n, t });
    }

    let residue_bits = 64 - (residue_bound - 1).leading_zeros();

    // Step 1: q, starting with t itself so that t | Q_q, then NTT-friendly
    // primes p == 1 (mod 2n), in ascending order, until the product exceeds
    // 2^q_bits.
    let q_primes = build_basis(&[t], twice_n, residue_bound, |product| product.bits() as u32 > q_bits)?
        .ok_or(ConfigError::BasisUnreachable { target_bits: q_bits, residue_bits })?;
    let q = RnsBasis::new(q_primes);
    let q_q = q.product();
    debug!(bits = q_q.bits(), primes = q.len(), "built ciphertext basis q");

    // Step 2: CRT coefficients alpha_i.
    let alpha = crt_coefficients(&q, &q_q);

    // Step 3: Delta = Q_q / t (exact, since t is the first prime of q), and
    // the big modulus Q = Q_q * Delta used to size B.
    let delta = &q_q / t;
    let q_big = &q_q * &delta;

    // Step 4: B, extending q, until prod(q ∪ B) > Q.
    let b_primes = build_basis(q.primes(), twice_n, residue_bound, |product| *product > q_big)?
        .ok_or(ConfigError::BasisUnreachable { target_bits: q_big.bits() as u32, residue_bits })?;
    let b = RnsBasis::new(b_primes);
    debug!(primes = b.len(), "built extension basis B");

    // Step 5: B_a, extending q ∪ B, until the product exceeds Q*R/2;
    // exactly one prime must be added.
    let q_union_b = q.union(&b);
    let threshold = &q_big * residue_bound / 2u32;
    let b_a_primes = build_basis(q_union_b.primes(), twice_n, residue_bound, |product| *product > threshold)?
        .ok_or(ConfigError::BasisUnreachable { target_bits: threshold.bits() as u32, residue_bits })?;
    if b_a_primes.len() != q_union_b.len() + 1 {
        return Err(ConfigError::AuxiliaryBasisNotSinglePrime {
            found: b_a_primes.len() - q_union_b.len(),
        });
    }
    let b_a = RnsBasis::new(vec![*b_a_primes.last().unwrap()]);
    debug!(prime = b_a.primes()[0], "built auxiliary basis B_a");

    // Step 6: encode/decode matrices.
    let (encode_matrix, decode_matrix) = build_slot_matrices(t, n)?;

    Ok(Config {
        t,
        n,
        secret_distribution,
        sigma,
        q,
        b,
        b_a,
        alpha,
        delta,
        q_big,
        encode_matrix,
        decode_matrix,
    })
}

/// Deterministically extends `seed_primes` with ascending NTT-friendly
/// primes (each `<= residue_bound`, `== 1 mod twice_n`) until `stop` returns
/// true on the running product. Returns `None` if the residue bound is
/// exhausted first.
fn build_basis(
    seed_primes: &[u64],
    twice_n: u64,
    residue_bound: u64,
    stop: impl Fn(&BigUint) -> bool,
) -> Result<Option<Vec<u64>>, ConfigError> {
    let mut primes: Vec<u64> = seed_primes.to_vec();
    let mut product: BigUint = primes.iter().fold(BigUint::one(), |acc, &p| acc * p);

    if stop(&product) {
        return Ok(Some(primes));
    }

    let mut search_from = primes.iter().copied().max().unwrap_or(2) + 1;
    loop {
        match next_ntt_friendly_prime(search_from, twice_n, residue_bound) {
            Some(p) if !primes.contains(&p) => {
                primes.push(p);
                product *= p;
                if stop(&product) {
                    return Ok(Some(primes));
                }
                search_from = p + 1;
            }
            Some(p) => {
                search_from = p + 1;
            }
            None => return Ok(None),
        }
    }
}

fn crt_coefficients(q: &RnsBasis, q_q: &BigUint) -> Vec<BigUint> {
    q.primes()
        .iter()
        .map(|&qi| {
            let qhat = q_q / qi;
            let qhat_mod_qi = biguint_to_u64(&(&qhat % qi));
            let inv = mod_inverse(&BigInt::from(qhat_mod_qi), &BigInt::from(qi))
                .expect("basis primes are pairwise coprime");
            (&qhat * to_biguint(&inv)) % q_q
        })
        .collect()
}

/// §4.4 step 6: `omega = g^{(t-1)/(2n)} mod t`; `alpha_k = omega^{2k+1} mod
/// t`; decode matrix row `k` is `(alpha_k^0, ..., alpha_k^{n-1}) mod t`;
/// encode matrix `E` is its modular inverse in `Z_t`.
fn build_slot_matrices(t: u64, n: usize) -> Result<(Vec<Vec<u64>>, Vec<Vec<u64>>), ConfigError> {
    let t_big = BigUint::from(t);
    let g = primitive_root(&t_big);
    let exponent = (t - 1) / (2 * n as u64);
    let omega = g.modpow(&BigUint::from(exponent), &t_big);

    let roots: Vec<u64> = (0..n)
        .map(|k| {
            let e = (2 * k + 1) as u64;
            biguint_to_u64(&omega.modpow(&BigUint::from(e), &t_big))
        })
        .collect();

    let modulus = Modulus::new(t);
    let decode_matrix: Vec<Vec<u64>> = roots
        .iter()
        .map(|&root| {
            let mut row = vec![1u64; n];
            for k in 1..n {
                row[k] = modulus.mul(row[k - 1], root);
            }
            row
        })
        .collect();

    let encode_matrix = invert_matrix_mod_p(&decode_matrix, t);
    Ok((encode_matrix, decode_matrix))
}

/// Gauss-Jordan inversion of an `n x n` matrix over `Z_p`, `p` prime.
fn invert_matrix_mod_p(matrix: &[Vec<u64>], p: u64) -> Vec<Vec<u64>> {
    let n = matrix.len();
    let m = Modulus::new(p);
    let mut aug: Vec<Vec<u64>> = (0..n)
        .map(|i| {
            let mut row = matrix[i].clone();
            row.extend((0..n).map(|j| if i == j { 1 } else { 0 }));
            row
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .find(|&r| aug[r][col] != 0)
            .expect("decode matrix (Vandermonde of distinct roots) is invertible mod t");
        aug.swap(col, pivot_row);

        let pivot_inv_bigint = mod_inverse(&BigInt::from(aug[col][col]), &BigInt::from(p))
            .expect("pivot is nonzero mod prime t, hence invertible");
        let pivot_inv = biguint_to_u64(&to_biguint(&pivot_inv_bigint));
        for v in aug[col].iter_mut() {
            *v = m.mul(*v, pivot_inv);
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor == 0 {
                continue;
            }
            for c in 0..(2 * n) {
                let sub = m.mul(factor, aug[col][c]);
                aug[row][c] = m.sub(aug[row][c], sub);
            }
        }
    }

    aug.into_iter().map(|row| row[n..].to_vec()).collect()
}
