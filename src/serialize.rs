//! Wire serialization (§6 "Ciphertext serialization").
//!
//! A ciphertext is an ordered pair of ring elements; each coefficient is an
//! RNS integer serialized as `L` residues in basis order, each residue a
//! fixed-width little-endian `u64` (the spec leaves big/little-endian as an
//! implementation choice "fixed per deployment" -- this crate fixes little-
//! endian). Grounded in `examples/marcosfpr-sealy/sealy/src/serialization.rs`,
//! the one example repo in the pack that serializes FHE ciphertext material
//! to bytes; the `ToBytes`/`FromBytes` trait split is taken from there.
//!
//! Deserializing a residue vector needs to know which basis it was encoded
//! against (residue count and modulus order aren't recoverable from the
//! bytes alone), so `FromBytes::State` is the basis to validate against --
//! same shape as sealy's `State` associated type, which there is a SEAL
//! context.

use crate::client::Ciphertext;
use crate::error::SerializeError;
use crate::ring::RingElement;
use crate::rns::{RnsBasis, RnsInt};

pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

pub trait FromBytes {
    type State;
    fn from_bytes(state: &Self::State, bytes: &[u8]) -> Result<Self, SerializeError>
    where
        Self: Sized;
}

impl ToBytes for RnsInt {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.residues().len() * 8);
        for &r in self.residues() {
            out.extend_from_slice(&r.to_le_bytes());
        }
        out
    }
}

impl FromBytes for RnsInt {
    type State = RnsBasis;

    fn from_bytes(basis: &RnsBasis, bytes: &[u8]) -> Result<Self, SerializeError> {
        let expected = basis.len() * 8;
        if bytes.len() != expected {
            return Err(SerializeError::UnexpectedLength { expected, got: bytes.len() });
        }
        let mut residues = Vec::with_capacity(basis.len());
        for (i, (chunk, &modulus)) in bytes.chunks_exact(8).zip(basis.primes().iter()).enumerate() {
            let value = u64::from_le_bytes(chunk.try_into().expect("chunk is exactly 8 bytes"));
            if value >= modulus {
                return Err(SerializeError::ResidueOutOfRange { index: i, value, modulus });
            }
            residues.push(value);
        }
        Ok(RnsInt::from_residues(residues, basis))
    }
}

impl ToBytes for RingElement {
    fn to_bytes(&self) -> Vec<u8> {
        self.coeffs().iter().flat_map(|c| c.to_bytes()).collect()
    }
}

impl FromBytes for RingElement {
    /// `(basis, degree n)` -- a ring element's byte length also depends on
    /// how many coefficients it has, which the basis alone doesn't carry.
    type State = (RnsBasis, usize);

    fn from_bytes((basis, n): &(RnsBasis, usize), bytes: &[u8]) -> Result<Self, SerializeError> {
        let residue_bytes = basis.len() * 8;
        let expected = residue_bytes * n;
        if bytes.len() != expected {
            return Err(SerializeError::UnexpectedLength { expected, got: bytes.len() });
        }
        let coeffs = bytes
            .chunks_exact(residue_bytes)
            .map(|chunk| RnsInt::from_bytes(basis, chunk))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RingElement::new(coeffs, basis))
    }
}

impl ToBytes for Ciphertext {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.a().to_bytes();
        out.extend(self.b().to_bytes());
        out
    }
}

impl FromBytes for Ciphertext {
    type State = (RnsBasis, usize);

    fn from_bytes(state: &(RnsBasis, usize), bytes: &[u8]) -> Result<Self, SerializeError> {
        let half_len = state.0.len() * 8 * state.1;
        let expected = half_len * 2;
        if bytes.len() != expected {
            return Err(SerializeError::UnexpectedLength { expected, got: bytes.len() });
        }
        let a = RingElement::from_bytes(state, &bytes[..half_len])?;
        let b = RingElement::from_bytes(state, &bytes[half_len..])?;
        Ok(Ciphertext::new(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::config::{make_config, SecretDistribution};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rns_int_round_trips() {
        let basis = RnsBasis::new(vec![97, 101, 103]);
        let x = RnsInt::construct(&num_bigint_dig::BigInt::from(123_456), &basis);
        let bytes = x.to_bytes();
        let back = RnsInt::from_bytes(&basis, &bytes).unwrap();
        assert_eq!(back.residues(), x.residues());
    }

    #[test]
    fn rns_int_rejects_wrong_length() {
        let basis = RnsBasis::new(vec![97, 101]);
        let err = RnsInt::from_bytes(&basis, &[0u8; 9]).unwrap_err();
        assert_eq!(err, SerializeError::UnexpectedLength { expected: 16, got: 9 });
    }

    #[test]
    fn rns_int_rejects_out_of_range_residue() {
        let basis = RnsBasis::new(vec![97, 101]);
        let mut bytes = vec![0u8; 16];
        bytes[0..8].copy_from_slice(&200u64.to_le_bytes());
        let err = RnsInt::from_bytes(&basis, &bytes).unwrap_err();
        assert_eq!(err, SerializeError::ResidueOutOfRange { index: 0, value: 200, modulus: 97 });
    }

    #[test]
    fn ciphertext_round_trips_through_bytes() {
        let cfg = make_config(257, 60, 8, SecretDistribution::Ternary).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let client = Client::new_with_rng(cfg.clone(), &mut rng);
        let ct = client.encrypt_with_rng(&[1, 2, 3, 4, 5, 6, 7, 8], &mut rng);

        let state = (cfg.q().clone(), cfg.n());
        let bytes = ct.to_bytes();
        let back = Ciphertext::from_bytes(&state, &bytes).unwrap();

        assert_eq!(client.decrypt(&back), client.decrypt(&ct));
    }
}
