//! Ring polynomial arithmetic (spec component C3).
//!
//! `R = Z[x] / (x^n + 1)`, `n` a power of two. A [`RingElement`] is exactly
//! `n` coefficients sharing one [`RnsBasis`]; the only required operation
//! beyond pointwise add/sub/scalar-mul is negacyclic convolution -- the
//! wrap-with-negation at index `n` that makes this ring "negacyclic" rather
//! than the plain cyclic convolution an ordinary DFT-friendly ring would
//! use. Schoolbook convolution (`O(n^2)`) is all the spec requires (NTT
//! multiplication is explicitly out of scope, §1); it is also what makes
//! `RingElement` generic over any coefficient type with ring operations,
//! rather than tied to a Number-Theoretic-Transform-friendly
//! representation.

use serde::{Deserialize, Serialize};

use crate::rns::{RnsBasis, RnsInt};

/// `n` coefficients of a polynomial in `R`, all RNS integers over the same
/// basis. Coefficient `i` is the coefficient of `x^i`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RingElement {
    basis: RnsBasis,
    coeffs: Vec<RnsInt>,
}

impl RingElement {
    pub fn new(coeffs: Vec<RnsInt>, basis: &RnsBasis) -> Self {
        assert!(!coeffs.is_empty(), "ring elements must have degree > 0");
        assert!(
            coeffs.iter().all(|c| c.basis() == basis),
            "every coefficient must share the ring element's basis"
        );
        RingElement { basis: basis.clone(), coeffs }
    }

    pub fn zero(n: usize, basis: &RnsBasis) -> Self {
        RingElement {
            basis: basis.clone(),
            coeffs: (0..n).map(|_| RnsInt::zero(basis)).collect(),
        }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len()
    }

    pub fn basis(&self) -> &RnsBasis {
        &self.basis
    }

    pub fn coeffs(&self) -> &[RnsInt] {
        &self.coeffs
    }

    pub fn coeffs_mut(&mut self) -> &mut [RnsInt] {
        &mut self.coeffs
    }

    fn assert_compatible(&self, other: &RingElement) {
        assert_eq!(self.degree(), other.degree(), "ring elements must share degree n");
        assert_eq!(self.basis, other.basis, "ring elements must share an RNS basis");
    }

    pub fn add(&self, other: &RingElement) -> RingElement {
        self.assert_compatible(other);
        let coeffs = self
            .coeffs
            .iter()
            .zip(other.coeffs.iter())
            .map(|(a, b)| a.add(b))
            .collect();
        RingElement { basis: self.basis.clone(), coeffs }
    }

    pub fn sub(&self, other: &RingElement) -> RingElement {
        self.assert_compatible(other);
        let coeffs = self
            .coeffs
            .iter()
            .zip(other.coeffs.iter())
            .map(|(a, b)| a.sub(b))
            .collect();
        RingElement { basis: self.basis.clone(), coeffs }
    }

    pub fn mul_constant(&self, c: u64) -> RingElement {
        let coeffs = self.coeffs.iter().map(|a| a.mul_constant(c)).collect();
        RingElement { basis: self.basis.clone(), coeffs }
    }

    /// Negacyclic convolution: `c[k] = sum_{i+j=k} a_i*b_j - sum_{i+j=k+n} a_i*b_j`.
    pub fn mul(&self, other: &RingElement) -> RingElement {
        self.assert_compatible(other);
        let n = self.degree();
        let mut coeffs: Vec<RnsInt> = (0..n).map(|_| RnsInt::zero(&self.basis)).collect();

        for i in 0..n {
            for j in 0..n {
                let term = self.coeffs[i].mul(&other.coeffs[j]);
                let k = i + j;
                if k < n {
                    coeffs[k] = coeffs[k].add(&term);
                } else {
                    coeffs[k - n] = coeffs[k - n].sub(&term);
                }
            }
        }
        RingElement { basis: self.basis.clone(), coeffs }
    }

    /// Applies a coefficient-wise RNS operation, producing a new ring
    /// element over `target_basis`. Used by the evaluator for mod-raise,
    /// mod-switch, and exact back-conversion, which all operate coefficient
    /// by coefficient rather than on the ring structure itself.
    pub fn map_coeffs(&self, target_basis: &RnsBasis, f: impl Fn(&RnsInt) -> RnsInt) -> RingElement {
        let coeffs: Vec<RnsInt> = self.coeffs.iter().map(f).collect();
        RingElement::new(coeffs, target_basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint_dig::BigInt;

    fn ring_of(values: &[i64], basis: &RnsBasis) -> RingElement {
        let coeffs = values
            .iter()
            .map(|&v| RnsInt::construct(&BigInt::from(v), basis))
            .collect();
        RingElement::new(coeffs, basis)
    }

    #[test]
    fn negacyclic_mul_wraps_with_negation() {
        // R = Z[x]/(x^2+1). (x) * (x) = x^2 = -1.
        let basis = RnsBasis::new(vec![97, 101]);
        let a = ring_of(&[0, 1], &basis);
        let b = ring_of(&[0, 1], &basis);
        let c = a.mul(&b);

        let q = basis.product();
        assert_eq!(c.coeffs()[0].to_integer(), (&q - 1u32) % &q);
        assert_eq!(c.coeffs()[1].to_integer(), num_bigint_dig::BigUint::from(0u32));
    }

    #[test]
    fn mul_matches_schoolbook_on_small_example() {
        // (1 + 2x) * (3 + 4x) = 3 + 10x + 8x^2 = 3 + 10x - 8 (mod x^2+1) = -5 + 10x
        let basis = RnsBasis::new(vec![97, 101]);
        let a = ring_of(&[1, 2], &basis);
        let b = ring_of(&[3, 4], &basis);
        let c = a.mul(&b);

        let q = basis.product();
        let expect0 = (&q - 5u32) % &q;
        assert_eq!(c.coeffs()[0].to_integer(), expect0);
        assert_eq!(c.coeffs()[1].to_integer(), num_bigint_dig::BigUint::from(10u32));
    }

    #[test]
    fn add_and_scalar_mul() {
        let basis = RnsBasis::new(vec![97, 101]);
        let a = ring_of(&[1, 2], &basis);
        let b = ring_of(&[3, 4], &basis);
        let sum = a.add(&b);
        assert_eq!(sum.coeffs()[0].to_integer(), num_bigint_dig::BigUint::from(4u32));
        assert_eq!(sum.coeffs()[1].to_integer(), num_bigint_dig::BigUint::from(6u32));

        let scaled = a.mul_constant(5);
        assert_eq!(scaled.coeffs()[0].to_integer(), num_bigint_dig::BigUint::from(5u32));
        assert_eq!(scaled.coeffs()[1].to_integer(), num_bigint_dig::BigUint::from(10u32));
    }
}
