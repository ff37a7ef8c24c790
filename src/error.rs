//! Error types.
//!
//! Per §7 of the spec, only one class of failure is ever returned as a
//! `Result`: configuration infeasibility from [`crate::config::make_config`].
//! Everything else -- mismatched RNS bases, wrong ring length, malformed
//! ciphertexts -- is a programmer-error precondition and fails loudly via
//! `assert!`/`panic!` at the call site, matching phantom-zone's own
//! `assert!`-heavy style (e.g. `src/multi_party.rs`, `src/rgsw/keygen.rs`).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("plaintext modulus t = {0} is not prime")]
    PlaintextModulusNotPrime(u64),

    #[error("ring degree n = {0} is not a power of two")]
    RingDegreeNotPowerOfTwo(usize),

    #[error("2n does not divide (t - 1): no 2n-th root of unity exists in Z_t for n = {n}, t = {t}")]
    NoRootOfUnity { n: usize, t: u64 },

    #[error("could not build an RNS basis reaching {target_bits} bits below the residue bound 2^{residue_bits}")]
    BasisUnreachable { target_bits: u32, residue_bits: u32 },

    #[error(
        "auxiliary basis B_a needed {found} primes (expected exactly 1) to exceed Q*R/2; retry with a larger residue bound"
    )]
    AuxiliaryBasisNotSinglePrime { found: usize },
}

/// Wire (de)serialization failures (`crate::serialize`). Not one of §7's two
/// error classes -- malformed bytes are an I/O-boundary concern, not a
/// programmer-error precondition or a configuration-infeasibility failure --
/// so it gets its own small type rather than overloading [`ConfigError`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerializeError {
    #[error("unexpected byte length: expected {expected}, got {got}")]
    UnexpectedLength { expected: usize, got: usize },

    #[error("residue {value} at position {index} is out of range for modulus {modulus}")]
    ResidueOutOfRange { index: usize, value: u64, modulus: u64 },
}
