//! Homomorphic evaluator (spec component C7).
//!
//! The server never sees the secret key -- only ciphertexts, plaintext
//! vectors it is asked to add/multiply in, and the public [`RelinKey`].
//! `add_cc`/`add_cp`/`mul_cp` are simple ring operations; `mul_cc` is the
//! BEHZ pipeline (§4.7): mod-raise to the extended basis `q ∪ B ∪ B_a`,
//! tensor, scale by `t`, mod-switch back down to `B ∪ B_a`, exact
//! back-conversion to `q`, and relinearize the resulting triple down to a
//! pair via the RNS-decomposed evaluation key.

use tracing::debug;

use crate::client::{Ciphertext, RelinKey};
use crate::config::Config;
use crate::encoder::encode;
use crate::ring::RingElement;
use crate::rns::{RnsBasis, RnsInt};

/// Evaluates homomorphic operations over ciphertexts produced by a
/// [`crate::client::Client`] built from the same [`Config`]. Holds no
/// secret material; every precomputed table it touches (`q`, `B`, `B_a`)
/// is shared read-only from `Config` (§3 "Ownership").
pub struct Server {
    config: Config,
    b_union_ba: RnsBasis,
    q_union_b_union_ba: RnsBasis,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let b_union_ba = config.b().union(config.b_a());
        let q_union_b_union_ba = config.q().union(&b_union_ba);
        Server { config, b_union_ba, q_union_b_union_ba }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ciphertext + ciphertext: `(A1+A2, B1+B2)`, coefficient-wise RNS add.
    pub fn add_cc(&self, c1: &Ciphertext, c2: &Ciphertext) -> Ciphertext {
        self.assert_on_q(c1);
        self.assert_on_q(c2);
        Ciphertext::new(c1.a().add(c2.a()), c1.b().add(c2.b()))
    }

    /// Ciphertext + plaintext: encode and RNS-lift `P`, scale by `Delta`,
    /// add to `B` only. `A` is unchanged.
    pub fn add_cp(&self, c: &Ciphertext, plain: &[u64]) -> Ciphertext {
        self.assert_on_q(c);
        let scaled = self.encode_and_scale(plain);
        Ciphertext::new(c.a().clone(), c.b().add(&scaled))
    }

    /// Ciphertext * plaintext: encode and RNS-lift `P` (unscaled -- a
    /// plaintext-domain multiplier, not a fresh encryption); negacyclic-
    /// multiply both `A` and `B` by it.
    pub fn mul_cp(&self, c: &Ciphertext, plain: &[u64]) -> Ciphertext {
        self.assert_on_q(c);
        let encoded = self.encode_lift(plain, self.config.q());
        Ciphertext::new(c.a().mul(&encoded), c.b().mul(&encoded))
    }

    /// Ciphertext * ciphertext: the BEHZ pipeline (§4.7).
    pub fn mul_cc(&self, c1: &Ciphertext, c2: &Ciphertext, relin_key: &RelinKey) -> Ciphertext {
        self.assert_on_q(c1);
        self.assert_on_q(c2);
        assert_eq!(
            relin_key.entries().len(),
            self.config.q().len(),
            "RLev must carry one entry per prime of q"
        );

        debug!("mul_cc: mod-raise to q ∪ B ∪ B_a");
        let a1 = self.mod_raise(c1.a());
        let b1 = self.mod_raise(c1.b());
        let a2 = self.mod_raise(c2.a());
        let b2 = self.mod_raise(c2.b());

        debug!("mul_cc: tensor");
        let d0 = b1.mul(&b2);
        let d1 = b1.mul(&a2).add(&b2.mul(&a1));
        let d2 = a1.mul(&a2);

        debug!("mul_cc: scale by t");
        let t = self.config.t();
        let d0 = d0.mul_constant(t);
        let d1 = d1.mul_constant(t);
        let d2 = d2.mul_constant(t);

        debug!("mul_cc: mod-switch dividing by Q_q");
        let d0 = self.mod_switch_down(&d0);
        let d1 = self.mod_switch_down(&d1);
        let d2 = self.mod_switch_down(&d2);

        debug!("mul_cc: exact back-conversion to q");
        let d0 = self.back_convert(&d0);
        let d1 = self.back_convert(&d1);
        let d2 = self.back_convert(&d2);

        debug!("mul_cc: relinearize");
        let (delta_a, delta_b) = self.relinearize(&d2, relin_key);

        Ciphertext::new(d1.add(&delta_a), d0.add(&delta_b))
    }

    fn assert_on_q(&self, c: &Ciphertext) {
        assert_eq!(c.a().basis(), self.config.q(), "ciphertext A must be on basis q");
        assert_eq!(c.b().basis(), self.config.q(), "ciphertext B must be on basis q");
        assert_eq!(c.a().degree(), self.config.n(), "ciphertext must have degree n");
    }

    fn encode_lift(&self, plain: &[u64], basis: &RnsBasis) -> RingElement {
        use num_bigint_dig::BigInt;
        let encoded = encode(&self.config, plain);
        let coeffs = encoded
            .iter()
            .map(|&m| RnsInt::construct(&BigInt::from(m), basis))
            .collect();
        RingElement::new(coeffs, basis)
    }

    fn encode_and_scale(&self, plain: &[u64]) -> RingElement {
        use num_bigint_dig::BigInt;
        let encoded = encode(&self.config, plain);
        let delta = self.config.delta();
        let q = self.config.q();
        let coeffs = encoded
            .iter()
            .map(|&m| {
                let scaled = BigInt::from(m) * BigInt::from(delta.clone());
                RnsInt::construct(&scaled, q)
            })
            .collect();
        RingElement::new(coeffs, q)
    }

    /// Mod-raise (§4.7 step 1): approximate fast base conversion from `q`
    /// to `q ∪ B ∪ B_a`, applied coefficient-wise.
    fn mod_raise(&self, elem: &RingElement) -> RingElement {
        elem.map_coeffs(&self.q_union_b_union_ba, |c| c.fast_base_conv(&self.q_union_b_union_ba))
    }

    /// Mod-switch (§4.7 step 4): divide by `Q_q`, dropping the `q` primes
    /// and leaving the rounded result on `B ∪ B_a`.
    fn mod_switch_down(&self, elem: &RingElement) -> RingElement {
        elem.map_coeffs(&self.b_union_ba, |c| c.mod_switch(self.config.q(), &self.b_union_ba))
    }

    /// Exact back-conversion (§4.7 step 5): `B ∪ B_a` back to `q`.
    fn back_convert(&self, elem: &RingElement) -> RingElement {
        elem.map_coeffs(self.config.q(), |c| {
            c.fast_base_conv_exact(self.config.b(), self.config.b_a(), self.config.q())
        })
    }

    /// Relinearize (§4.7 step 6): gadget-decompose `d2` along the primes of
    /// `q` and accumulate `sum_i P_i * RLev_i` as a ciphertext pair.
    fn relinearize(&self, d2: &RingElement, relin_key: &RelinKey) -> (RingElement, RingElement) {
        use num_bigint_dig::BigInt;

        let q = self.config.q();
        let n = self.config.n();
        let mut delta_a = RingElement::zero(n, q);
        let mut delta_b = RingElement::zero(n, q);

        for (i, &qi) in q.primes().iter().enumerate() {
            // P_i: coefficient j is d2[j]'s residue on q_i, broadcast as a
            // full RNS integer over q (not confined to q_i alone).
            let p_i_coeffs: Vec<RnsInt> = d2
                .coeffs()
                .iter()
                .map(|c| RnsInt::construct(&BigInt::from(c.residue_on(qi)), q))
                .collect();
            let p_i = RingElement::new(p_i_coeffs, q);

            let entry = &relin_key.entries()[i];
            delta_a = delta_a.add(&p_i.mul(entry.a()));
            delta_b = delta_b.add(&p_i.mul(entry.b()));
        }

        (delta_a, delta_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::config::{make_config, SecretDistribution};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_setup() -> (Client, Server) {
        let cfg = make_config(257, 300, 8, SecretDistribution::Ternary).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let client = Client::new_with_rng(cfg.clone(), &mut rng);
        let server = Server::new(cfg);
        (client, server)
    }

    #[test]
    fn add_cc_matches_componentwise_sum() {
        let (client, server) = small_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let v2: Vec<u64> = vec![2, 3, 4, 5, 4, 3, 2, 3];
        let c1 = client.encrypt_with_rng(&v1, &mut rng);
        let c2 = client.encrypt_with_rng(&v2, &mut rng);

        let sum = server.add_cc(&c1, &c2);
        let decrypted = client.decrypt(&sum);
        assert_eq!(decrypted, vec![3, 5, 7, 9, 9, 9, 9, 11]);
    }

    #[test]
    fn add_cp_matches_componentwise_sum() {
        let (client, server) = small_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let p: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let c1 = client.encrypt_with_rng(&v1, &mut rng);

        let sum = server.add_cp(&c1, &p);
        let decrypted = client.decrypt(&sum);
        assert_eq!(decrypted, vec![2, 4, 6, 8, 10, 12, 14, 16]);
    }

    #[test]
    fn mul_cp_matches_componentwise_product() {
        let (client, server) = small_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let p: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let c1 = client.encrypt_with_rng(&v1, &mut rng);

        let product = server.mul_cp(&c1, &p);
        let decrypted = client.decrypt(&product);
        assert_eq!(decrypted, vec![1, 4, 9, 16, 25, 36, 49, 64]);
    }

    #[test]
    fn mul_cc_matches_componentwise_product() {
        let (client, server) = small_setup();
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let v2: Vec<u64> = vec![2, 3, 4, 5, 4, 3, 2, 3];
        let c1 = client.encrypt_with_rng(&v1, &mut rng);
        let c2 = client.encrypt_with_rng(&v2, &mut rng);

        let product = server.mul_cc(&c1, &c2, client.relin_key());
        let decrypted = client.decrypt(&product);
        assert_eq!(decrypted, vec![2, 6, 12, 20, 20, 18, 14, 24]);
    }
}
