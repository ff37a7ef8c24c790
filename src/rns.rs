//! RNS residue integer (spec component C2).
//!
//! A large integer `x` in `[0, Q)`, `Q = prod(basis)`, represented as the
//! vector of its residues modulo each (pairwise-coprime) element of
//! `basis`. The basis is reference-counted and shared by every `RnsInt`
//! built over it rather than cloned per value (design note 9: "the basis
//! reference should be borrowed, not owned per residue, to keep per-
//! coefficient memory small and hot").

use std::sync::Arc;

use num_bigint_dig::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::backend::{ArithmeticOps, Modulus};
use crate::numeric::{crt_reconstruct, mod_inverse, to_biguint};

/// An ordered, pairwise-coprime set of prime moduli. Cheap to clone (an
/// `Arc` bump) so `RnsInt`s and `RingElement`s can share one basis freely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RnsBasis {
    primes: Arc<[u64]>,
}

impl RnsBasis {
    pub fn new(primes: Vec<u64>) -> Self {
        assert!(!primes.is_empty(), "RNS basis must not be empty");
        debug_assert!(
            pairwise_coprime(&primes),
            "RNS basis primes must be pairwise coprime"
        );
        RnsBasis {
            primes: primes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn moduli(&self) -> impl Iterator<Item = Modulus> + '_ {
        self.primes.iter().map(|&p| Modulus::new(p))
    }

    /// `Q = prod(basis)`, as a big integer. Not cached: basis products are
    /// computed in configuration setup and in the (non-hot-path) base
    /// conversion helpers below, never inside the per-coefficient loop.
    pub fn product(&self) -> BigUint {
        self.primes
            .iter()
            .fold(BigUint::from(1u32), |acc, &p| acc * p)
    }

    /// Concatenation of two bases (used to build `q ∪ B`, `B ∪ B_a`, etc).
    pub fn union(&self, other: &RnsBasis) -> RnsBasis {
        let mut primes: Vec<u64> = self.primes.iter().chain(other.primes.iter()).copied().collect();
        primes.dedup();
        RnsBasis::new(primes)
    }
}

impl PartialEq for RnsBasis {
    fn eq(&self, other: &Self) -> bool {
        self.primes.as_ref() == other.primes.as_ref()
    }
}
impl Eq for RnsBasis {}

fn pairwise_coprime(primes: &[u64]) -> bool {
    for i in 0..primes.len() {
        for j in (i + 1)..primes.len() {
            if gcd_u64(primes[i], primes[j]) != 1 {
                return false;
            }
        }
    }
    true
}

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// A non-negative integer `< prod(basis)`, represented by its residues.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RnsInt {
    basis: RnsBasis,
    residues: Vec<u64>,
}

impl RnsInt {
    /// `residues[i] = x mod basis[i]`. `x` may be of arbitrary sign; the
    /// residues are always stored in canonical non-negative form.
    pub fn construct(x: &BigInt, basis: &RnsBasis) -> Self {
        let residues = basis
            .primes()
            .iter()
            .map(|&p| {
                let m = BigInt::from(p);
                let r = x.mod_floor_big(&m);
                r.to_u64_digit()
            })
            .collect();
        RnsInt {
            basis: basis.clone(),
            residues,
        }
    }

    pub fn from_residues(residues: Vec<u64>, basis: &RnsBasis) -> Self {
        assert_eq!(residues.len(), basis.len(), "residue/basis length mismatch");
        RnsInt {
            basis: basis.clone(),
            residues,
        }
    }

    pub fn zero(basis: &RnsBasis) -> Self {
        RnsInt {
            basis: basis.clone(),
            residues: vec![0u64; basis.len()],
        }
    }

    pub fn basis(&self) -> &RnsBasis {
        &self.basis
    }

    pub fn residues(&self) -> &[u64] {
        &self.residues
    }

    /// Residue on a specific prime, found by basis membership. Panics if
    /// `prime` is not in this value's basis.
    pub fn residue_on(&self, prime: u64) -> u64 {
        let idx = self
            .basis
            .primes()
            .iter()
            .position(|&p| p == prime)
            .expect("prime is not a member of this RnsInt's basis");
        self.residues[idx]
    }

    fn assert_same_basis(&self, other: &RnsInt) {
        assert_eq!(self.basis, other.basis, "RNS operands must share a basis");
    }

    pub fn add(&self, other: &RnsInt) -> RnsInt {
        self.assert_same_basis(other);
        let residues = self
            .basis
            .moduli()
            .zip(self.residues.iter().zip(other.residues.iter()))
            .map(|(m, (&a, &b))| m.add(a, b))
            .collect();
        RnsInt { basis: self.basis.clone(), residues }
    }

    pub fn sub(&self, other: &RnsInt) -> RnsInt {
        self.assert_same_basis(other);
        let residues = self
            .basis
            .moduli()
            .zip(self.residues.iter().zip(other.residues.iter()))
            .map(|(m, (&a, &b))| m.sub(a, b))
            .collect();
        RnsInt { basis: self.basis.clone(), residues }
    }

    pub fn mul(&self, other: &RnsInt) -> RnsInt {
        self.assert_same_basis(other);
        let residues = self
            .basis
            .moduli()
            .zip(self.residues.iter().zip(other.residues.iter()))
            .map(|(m, (&a, &b))| m.mul(a, b))
            .collect();
        RnsInt { basis: self.basis.clone(), residues }
    }

    /// Multiply every residue by the same scalar constant `c` (reduced mod
    /// each basis prime first).
    pub fn mul_constant(&self, c: u64) -> RnsInt {
        let residues = self
            .basis
            .moduli()
            .zip(self.residues.iter())
            .map(|(m, &a)| m.mul(a, m.reduce(c)))
            .collect();
        RnsInt { basis: self.basis.clone(), residues }
    }

    /// CRT reconstruction into `[0, Q)`.
    pub fn to_integer(&self) -> BigUint {
        let moduli: Vec<BigInt> = self.basis.primes().iter().map(|&p| BigInt::from(p)).collect();
        let residues: Vec<BigInt> = self.residues.iter().map(|&r| BigInt::from(r)).collect();
        to_biguint(&crt_reconstruct(&residues, &moduli, false))
    }

    /// CRT reconstruction centered into `(-Q/2, Q/2]`.
    pub fn to_integer_centered(&self) -> BigInt {
        let moduli: Vec<BigInt> = self.basis.primes().iter().map(|&p| BigInt::from(p)).collect();
        let residues: Vec<BigInt> = self.residues.iter().map(|&r| BigInt::from(r)).collect();
        crt_reconstruct(&residues, &moduli, true)
    }

    /// Approximate fast base conversion (§4.2): convert `self` (represented
    /// on its own basis `q`) onto `target`, without reconstructing `x` as a
    /// big integer. The result equals `x + kappa * Q_q` for some small
    /// `0 <= kappa < basis.len()`, reduced onto `target`; callers on the
    /// hot path (mod-raise) must tolerate that error, and callers that need
    /// an exact answer use [`RnsInt::fast_base_conv_exact`] instead.
    pub fn fast_base_conv(&self, target: &RnsBasis) -> RnsInt {
        let out = fast_base_conv_raw(self.basis.primes(), &self.residues, target.primes());
        RnsInt { basis: target.clone(), residues: out }
    }

    /// Exact base conversion via a single-prime auxiliary basis `b_a`
    /// (§4.2). `self` must be represented on `b.union(b_a)`. Returns `x`
    /// (exactly, no `kappa` error) represented on `target`.
    pub fn fast_base_conv_exact(&self, b: &RnsBasis, b_a: &RnsBasis, target: &RnsBasis) -> RnsInt {
        assert_eq!(b_a.len(), 1, "the auxiliary basis B_a must hold exactly one prime");
        assert_eq!(
            self.basis,
            b.union(b_a),
            "fast_base_conv_exact requires self to be represented on B ∪ B_a"
        );
        let ba_prime = b_a.primes()[0];
        let ba_modulus = Modulus::new(ba_prime);

        let x_b_residues: Vec<u64> = b
            .primes()
            .iter()
            .map(|&p| self.residue_on(p))
            .collect();
        let x_ba_residue = self.residue_on(ba_prime);

        // y = fast_base_conv(x_B, B_a) interpreted mod b_a_prime.
        let y = fast_base_conv_raw(b.primes(), &x_b_residues, b_a.primes())[0];

        let prod_b = b.product();
        let prod_b_mod_ba = (&prod_b % ba_prime).to_u64_digit();
        let inv_prod_b_mod_ba = mod_inverse(&BigInt::from(prod_b_mod_ba), &BigInt::from(ba_prime))
            .expect("prod(B) must be invertible mod B_a")
            .to_u64_digit();

        // kappa = (y - x_Ba) * prod(B)^{-1} mod b_a_prime. kappa is a small
        // non-negative integer (< |b|, by construction of B_a > 2*|b|), so
        // the canonical non-negative residue *is* kappa: no separate signed
        // centering step is needed (see DESIGN.md, Open Question 3).
        let diff = ba_modulus.sub(y, x_ba_residue);
        let kappa = ba_modulus.mul(diff, inv_prod_b_mod_ba);

        let converted = fast_base_conv_raw(b.primes(), &x_b_residues, target.primes());
        let residues = target
            .moduli()
            .zip(converted.iter())
            .map(|(m, &conv_j)| {
                let prod_b_mod_target = m.reduce((&prod_b % m.value()).to_u64_digit());
                let correction = m.mul(kappa, prod_b_mod_target);
                m.sub(conv_j, correction)
            })
            .collect();
        RnsInt { basis: target.clone(), residues }
    }

    /// Modulus switching (§4.2): `self` is represented on `d.union(f)`;
    /// returns `round(x / prod(d))` represented on `f`.
    pub fn mod_switch(&self, d: &RnsBasis, f: &RnsBasis) -> RnsInt {
        assert_eq!(
            self.basis,
            d.union(f),
            "mod_switch requires self to be represented on d ∪ f"
        );
        let x_d_residues: Vec<u64> = d.primes().iter().map(|&p| self.residue_on(p)).collect();
        let x_f_residues: Vec<u64> = f.primes().iter().map(|&p| self.residue_on(p)).collect();

        let conv = fast_base_conv_raw(d.primes(), &x_d_residues, f.primes());
        let prod_d = d.product();

        let residues = f
            .moduli()
            .zip(x_f_residues.iter().zip(conv.iter()))
            .map(|(m, (&xf, &c))| {
                let prod_d_mod_f = m.reduce((&prod_d % m.value()).to_u64_digit());
                let inv = mod_inverse(&BigInt::from(prod_d_mod_f), &BigInt::from(m.value()))
                    .expect("prod(d) must be invertible mod each prime of f")
                    .to_u64_digit();
                let diff = m.sub(xf, c);
                m.mul(diff, inv)
            })
            .collect();
        RnsInt { basis: f.clone(), residues }
    }
}

/// Core of §4.2's fast (approximate) base conversion, shared by
/// `fast_base_conv`, `fast_base_conv_exact`, and `mod_switch`.
///
/// For each target modulus `b_j`:
/// `y_j = sum_i ((x_i * inv((Q/q_i) mod q_i, q_i)) * (Q/q_i mod b_j)) mod b_j`
fn fast_base_conv_raw(source: &[u64], residues: &[u64], target: &[u64]) -> Vec<u64> {
    assert_eq!(source.len(), residues.len());
    let source_product: BigUint = source.iter().fold(BigUint::from(1u32), |acc, &p| acc * p);
    let qhat: Vec<BigUint> = source.iter().map(|&qi| &source_product / qi).collect();

    // t_i = (x_i * inv(Q/q_i mod q_i)) mod q_i
    let t: Vec<u64> = source
        .iter()
        .zip(residues.iter())
        .zip(qhat.iter())
        .map(|((&qi, &xi), qhat_i)| {
            let qhat_mod_qi = (qhat_i % qi).to_u64_digit();
            let inv = mod_inverse(&BigInt::from(qhat_mod_qi), &BigInt::from(qi))
                .expect("RNS basis primes must be pairwise coprime")
                .to_u64_digit();
            let mqi = Modulus::new(qi);
            mqi.mul(xi, inv)
        })
        .collect();

    target
        .iter()
        .map(|&bj| {
            let mbj = Modulus::new(bj);
            let mut acc: u128 = 0;
            for (qhat_i, &ti) in qhat.iter().zip(t.iter()) {
                let qhat_mod_bj = (qhat_i % bj).to_u64_digit();
                acc += ti as u128 * qhat_mod_bj as u128;
            }
            mbj.reduce128(acc)
        })
        .collect()
}

/// Extracts the low 64 bits of a non-negative big integer known (by
/// construction at every call site here) to fit in a `u64` -- it is always
/// either a raw basis prime, a residue, or a value already reduced modulo
/// one. Implemented over bytes rather than `to_u64_digits` for portability
/// across `num-bigint-dig` versions.
trait ToU64Digit {
    fn to_u64_digit(&self) -> u64;
}
impl ToU64Digit for BigUint {
    fn to_u64_digit(&self) -> u64 {
        let bytes = self.to_bytes_le();
        let mut buf = [0u8; 8];
        let n = bytes.len().min(8);
        buf[..n].copy_from_slice(&bytes[..n]);
        u64::from_le_bytes(buf)
    }
}
impl ToU64Digit for BigInt {
    fn to_u64_digit(&self) -> u64 {
        to_biguint(self).to_u64_digit()
    }
}

/// Low 64 bits of a non-negative big integer known to fit in a `u64`.
/// Shared with [`crate::config`], which performs the same kind of
/// basis-prime-sized reductions while building CRT and slot-encoding
/// tables.
pub(crate) fn biguint_to_u64(x: &BigUint) -> u64 {
    x.to_u64_digit()
}

trait ModFloorBig {
    fn mod_floor_big(&self, m: &BigInt) -> BigInt;
}
impl ModFloorBig for BigInt {
    fn mod_floor_big(&self, m: &BigInt) -> BigInt {
        use num_integer::Integer;
        self.mod_floor(m)
    }
}
