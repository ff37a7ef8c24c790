//! Encryption / decryption (spec component C6).
//!
//! The client is the only party that ever holds the secret key. It samples
//! `S` once at construction (§4.6 "key gen"), derives the relinearization
//! key `RLev` from it, and from then on only ever touches plaintext vectors
//! and ciphertexts -- the RLWE secret itself never crosses `Client`'s
//! boundary (§3 "Secret key: ... Never leaves the client.").

use num_bigint_dig::{BigInt, BigUint};
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::backend::ArithmeticOps;
use crate::config::{Config, SecretDistribution};
use crate::encoder::{decode, encode};
use crate::random::{sample_binary, sample_small_gaussian, sample_ternary, DefaultSecureRng, StdRandomSource};
use crate::ring::RingElement;
use crate::rns::{RnsBasis, RnsInt};

/// Ring element with small, signed coefficients (§3 "Secret key"). Kept as
/// plain `i64`s rather than lifted into RNS immediately: the secret is
/// reduced onto whatever basis an RLWE operation needs (`q`, or `q ∪ B ∪
/// B_a` for the relin key), and a signed integer is the one representation
/// that reduces consistently to the same residue under every modulus
/// (§4.6 design note in `random.rs`).
#[derive(Clone, Debug)]
pub struct SecretKey {
    coeffs: Vec<i64>,
}

impl SecretKey {
    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    /// Lift into a ring element over `basis`.
    fn to_ring(&self, basis: &RnsBasis) -> RingElement {
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| RnsInt::construct(&BigInt::from(c), basis))
            .collect();
        RingElement::new(coeffs, basis)
    }
}

/// A ciphertext pair `(A, B)` over the ciphertext basis `q` (§3
/// "Ciphertext"). `B + A*S ≈ Delta*M (mod q)`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext {
    pub(crate) a: RingElement,
    pub(crate) b: RingElement,
}

impl Ciphertext {
    pub fn new(a: RingElement, b: RingElement) -> Self {
        assert_eq!(a.degree(), b.degree(), "ciphertext halves must share degree n");
        assert_eq!(a.basis(), b.basis(), "ciphertext halves must share a basis");
        Ciphertext { a, b }
    }

    pub fn a(&self) -> &RingElement {
        &self.a
    }
    pub fn b(&self) -> &RingElement {
        &self.b
    }
}

/// The relinearization / evaluation key (§3 "Evaluation (relinearization)
/// key RLev"): one RLWE ciphertext per prime of `q`, the `i`-th encrypting
/// `alpha_i * S^2`. Produced once at client construction; read-only
/// thereafter; safe to hand to the (untrusted) server.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RelinKey {
    pub(crate) entries: Vec<Ciphertext>,
}

impl RelinKey {
    pub fn entries(&self) -> &[Ciphertext] {
        &self.entries
    }
}

/// Holds the secret key and the precomputed relin key; the only party able
/// to decrypt.
pub struct Client {
    config: Config,
    secret: SecretKey,
    relin_key: RelinKey,
}

impl Client {
    /// Key generation (§4.6 "key gen"): sample `S`, build `RLev` from
    /// `alpha_i * S^2` for every prime of `q`, using the OS-seeded default
    /// RNG.
    pub fn new(config: Config) -> Self {
        let mut rng = DefaultSecureRng::from_entropy();
        Self::new_with_rng(config, &mut rng)
    }

    /// As [`Client::new`], but with a caller-supplied RNG -- the hook §5's
    /// "for tests the source is seeded deterministically" exists for.
    pub fn new_with_rng(config: Config, rng: &mut impl Rng) -> Self {
        let secret_coeffs = match config.secret_distribution() {
            SecretDistribution::Ternary => sample_ternary(rng, config.n()),
            SecretDistribution::Binary => sample_binary(rng, config.n()),
        };
        let secret = SecretKey { coeffs: secret_coeffs };

        let relin_key = build_relin_key(&config, &secret, rng);
        debug!(params = %config.describe(), "client key generation complete");

        Client { config, secret, relin_key }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn relin_key(&self) -> &RelinKey {
        &self.relin_key
    }

    /// Encrypt plaintext vector `P` (§4.6 "Encrypt plaintext vector P"):
    /// `X = Delta * encode(P mod t) mod Q_q`, then RLWE-encrypt `X`.
    pub fn encrypt(&self, v: &[u64]) -> Ciphertext {
        let mut rng = DefaultSecureRng::from_entropy();
        self.encrypt_with_rng(v, &mut rng)
    }

    pub fn encrypt_with_rng(&self, v: &[u64], rng: &mut impl Rng) -> Ciphertext {
        let scaled = scale_plaintext(&self.config, v);
        rlwe_encrypt(&self.config, &self.secret, &scaled, rng)
    }

    /// Decrypt (§4.6 "Decrypt (A, B)"): reconstruct `u = B + A*S mod Q_q`,
    /// center-lift, round-divide by `Delta`, reduce mod `t`, decode.
    pub fn decrypt(&self, ct: &Ciphertext) -> Vec<u64> {
        let q = self.config.q();
        assert_eq!(ct.a.basis(), q, "ciphertext must be on the q basis to decrypt");
        assert_eq!(ct.a.degree(), self.config.n(), "ciphertext must have degree n");

        let s_ring = self.secret.to_ring(q);
        let a_s = ct.a.mul(&s_ring);
        let u = ct.b.add(&a_s);

        let q_q = self.config.q_q();
        let delta = self.config.delta();
        let t = self.config.t();

        let m: Vec<u64> = u
            .coeffs()
            .iter()
            .map(|c| {
                let centered = c.to_integer_centered();
                round_divide_mod_t(&centered, delta, &q_q, t)
            })
            .collect();

        decode(&self.config, &m)
    }
}

/// `m_hat = round((u + Delta/2) / Delta) mod t`, with `u` taken in its
/// centered representative so the rounding is symmetric around zero
/// (§4.6 steps 3-5).
fn round_divide_mod_t(u_centered: &BigInt, delta: &BigUint, _q_q: &BigUint, t: u64) -> u64 {
    let delta_big = BigInt::from(delta.clone());
    let half_delta = &delta_big / 2;
    let numerator = u_centered + &half_delta;
    // Floor division toward -infinity, matching round-to-nearest for the
    // centered input.
    let m_hat = floor_div(&numerator, &delta_big);
    let t_big = BigInt::from(t);
    let reduced = ((m_hat % &t_big) + &t_big) % &t_big;
    crate::numeric::biguint_to_u64_mod(&crate::numeric::to_biguint(&reduced), t)
}

fn floor_div(a: &BigInt, b: &BigInt) -> BigInt {
    use num_integer::Integer;
    a.div_floor(b)
}

/// `X = Delta * encode(v mod t) mod Q_q`, returned as plain signed
/// integers ready for [`rlwe_encrypt`]'s RNS lift (§4.6 "Encrypt plaintext
/// vector P").
fn scale_plaintext(config: &Config, v: &[u64]) -> Vec<BigInt> {
    let m = encode(config, v);
    let delta = config.delta();
    m.iter().map(|&coeff| BigInt::from(coeff) * BigInt::from(delta.clone())).collect()
}

/// RLWE encryption of an integer-coefficient polynomial `X` under modulus
/// `Q_q` (§4.6):
/// 1. sample `A` uniform in `[0, Q_q)^n`;
/// 2. sample `E` from a centered discrete Gaussian;
/// 3. `B = (-A*S + X + E) mod Q_q`;
/// 4. return `(A, B)` with coefficients lifted into RNS on basis `q`.
fn rlwe_encrypt(config: &Config, secret: &SecretKey, x: &[BigInt], rng: &mut impl Rng) -> Ciphertext {
    rlwe_encrypt_on_basis(config.q(), config.n(), secret, config.sigma(), x, rng)
}

/// As [`rlwe_encrypt`], but over an arbitrary basis -- used by relin-key
/// generation, which encrypts `alpha_i * S^2` on the same basis `q` but
/// wants to reuse the same sampling logic without threading a full
/// [`Config`] through.
fn rlwe_encrypt_on_basis(
    basis: &RnsBasis,
    n: usize,
    secret: &SecretKey,
    sigma: f64,
    x: &[BigInt],
    rng: &mut impl Rng,
) -> Ciphertext {
    assert_eq!(x.len(), n, "plaintext polynomial must have degree n");

    // Sample A uniformly in [0, Q_q)^n by sampling each coefficient's residue
    // independently and uniformly per prime (§4.6 step 1; see random.rs for
    // why this is equivalent to sampling a uniform integer via CRT).
    let mut per_coeff_residues: Vec<Vec<u64>> = vec![Vec::with_capacity(basis.len()); n];
    for m in basis.moduli() {
        let mut buf = vec![0u64; n];
        StdRandomSource::random_fill_uniform(rng, &m, &mut buf);
        for (slot, &r) in per_coeff_residues.iter_mut().zip(buf.iter()) {
            slot.push(r);
        }
    }
    let a_coeffs: Vec<RnsInt> = per_coeff_residues
        .into_iter()
        .map(|residues| RnsInt::from_residues(residues, basis))
        .collect();
    let a = RingElement::new(a_coeffs, basis);

    let errors = sample_small_gaussian(rng, sigma, n);
    let s_ring = secret.to_ring(basis);
    let neg_a_s = a.mul(&s_ring).mul_constant_signed(-1, basis);

    let x_ring: Vec<RnsInt> = x.iter().map(|xi| RnsInt::construct(xi, basis)).collect();
    let x_ring = RingElement::new(x_ring, basis);

    let e_ring: Vec<RnsInt> = errors.iter().map(|&e| RnsInt::construct(&BigInt::from(e), basis)).collect();
    let e_ring = RingElement::new(e_ring, basis);

    let b = neg_a_s.add(&x_ring).add(&e_ring);
    Ciphertext::new(a, b)
}

/// Build `RLev`: one RLWE encryption of `alpha_i * S^2` per prime of `q`
/// (§3 "Evaluation (relinearization) key").
fn build_relin_key(config: &Config, secret: &SecretKey, rng: &mut impl Rng) -> RelinKey {
    let q = config.q();
    let n = config.n();
    let s_ring = secret.to_ring(q);
    let s_squared = s_ring.mul(&s_ring);

    let entries = config
        .alpha()
        .iter()
        .map(|alpha_i| {
            let alpha_residues: Vec<u64> = q
                .primes()
                .iter()
                .map(|&p| crate::numeric::biguint_to_u64_mod(alpha_i, p))
                .collect();
            let s2_scaled = scale_ring_by_alpha(&s_squared, q, &alpha_residues);
            let x: Vec<BigInt> = s2_scaled
                .coeffs()
                .iter()
                .map(|c| BigInt::from(c.to_integer()))
                .collect();
            rlwe_encrypt_on_basis(q, n, secret, config.sigma(), &x, rng)
        })
        .collect();

    RelinKey { entries }
}

/// Multiplies a ring element, coefficient-by-coefficient, by the scalar
/// `alpha_i` expressed as its per-prime residues (an `RnsInt` built from
/// constant residues, not from a shared integer value -- `alpha_i` is
/// already reduced mod `Q_q` by [`crate::config::make_config`]).
fn scale_ring_by_alpha(ring: &RingElement, basis: &RnsBasis, alpha_residues: &[u64]) -> RingElement {
    let alpha_as_rns = RnsInt::from_residues(alpha_residues.to_vec(), basis);
    let coeffs = ring.coeffs().iter().map(|c| c.mul(&alpha_as_rns)).collect();
    RingElement::new(coeffs, basis)
}

/// Extension trait used only for negating a ring element in place of a
/// dedicated `RingElement::neg` -- multiplying every coefficient by `-1 mod
/// basis[i]` is exactly `ArithmeticOps::neg`, applied coefficient-wise.
trait MulConstantSigned {
    fn mul_constant_signed(&self, c: i64, basis: &RnsBasis) -> RingElement;
}

impl MulConstantSigned for RingElement {
    fn mul_constant_signed(&self, c: i64, basis: &RnsBasis) -> RingElement {
        assert!(c == -1, "only negation is needed by this crate's RLWE encrypt path");
        let coeffs = self
            .coeffs()
            .iter()
            .map(|coeff| {
                let residues: Vec<u64> = basis
                    .moduli()
                    .zip(coeff.residues().iter())
                    .map(|(m, &r)| m.neg(r))
                    .collect();
                RnsInt::from_residues(residues, basis)
            })
            .collect();
        RingElement::new(coeffs, basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::make_config;
    use rand_chacha::ChaCha8Rng;

    fn test_client() -> Client {
        let cfg = make_config(257, 60, 8, SecretDistribution::Ternary).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        Client::new_with_rng(cfg, &mut rng)
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let client = test_client();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let v: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let ct = client.encrypt_with_rng(&v, &mut rng);
        let decrypted = client.decrypt(&ct);
        assert_eq!(decrypted, v);
    }

    #[test]
    fn two_encryptions_of_same_plaintext_differ_but_both_decrypt_correctly() {
        let client = test_client();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let v: Vec<u64> = vec![10, 20, 30, 40, 50, 60, 70, 80];
        let ct1 = client.encrypt_with_rng(&v, &mut rng);
        let ct2 = client.encrypt_with_rng(&v, &mut rng);

        assert_ne!(ct1.a().coeffs()[0].residues(), ct2.a().coeffs()[0].residues());
        assert_eq!(client.decrypt(&ct1), v);
        assert_eq!(client.decrypt(&ct2), v);
    }

    #[test]
    fn relin_key_has_one_entry_per_prime_of_q() {
        let client = test_client();
        assert_eq!(client.relin_key().entries().len(), client.config().q().len());
    }
}
