//! `ring-bfv`: a from-scratch BFV (Brakerski/Fan-Vercauteren) Ring-LWE
//! homomorphic encryption core.
//!
//! A [`client::Client`] encrypts integer vectors into [`client::Ciphertext`]s
//! that an untrusted [`server::Server`] can add and multiply -- including
//! ciphertext-by-ciphertext multiplication via the BEHZ RNS pipeline
//! (mod-raise, tensor, scale, mod-switch, exact back-conversion,
//! relinearization) -- without ever seeing the secret key. Slot batching
//! (`encoder`) lets one ciphertext carry a vector of `n` independent
//! integers mod a prime `t`.
//!
//! Module layout mirrors the dependency order of the scheme itself, leaves
//! first:
//! - [`numeric`] -- arbitrary-precision number theory (primality, primitive
//!   roots, modular inverse, CRT).
//! - [`backend`] -- single-modulus machine-word arithmetic.
//! - [`rns`] -- residue-number-system integers and RNS base conversion.
//! - [`ring`] -- negacyclic polynomial ring arithmetic over RNS coefficients.
//! - [`config`] -- parameter selection: RNS bases, CRT coefficients, slot
//!   encoder matrices.
//! - [`encoder`] -- CRT batch slot encoding.
//! - [`random`] -- uniform and discrete-Gaussian sampling traits.
//! - [`client`] -- key generation, encryption, decryption.
//! - [`server`] -- the homomorphic evaluator.
//! - [`serialize`] -- wire (de)serialization of ciphertext material.
//!
//! Out of scope (§1 of the design spec this crate implements): CLI
//! front-ends, NTT-accelerated multiplication, bootstrapping, rotations, and
//! proven concrete security parameters.

pub mod backend;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod numeric;
pub mod random;
pub mod ring;
pub mod rns;
pub mod serialize;
pub mod server;
