//! End-to-end scenarios, directly from the scheme's testable properties:
//! encrypt/decrypt round-trips, homomorphic add/mul against plaintext and
//! ciphertext operands, and the concrete worked example (t=257, n=8,
//! q_bits=300) of encrypting two vectors and checking every evaluator
//! operation against its plain arithmetic equivalent.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ring_bfv::client::Client;
use ring_bfv::config::{make_config, SecretDistribution};
use ring_bfv::server::Server;

const T: u64 = 257;
const N: usize = 8;
const Q_BITS: u32 = 300;

fn setup(seed: u64) -> (Client, Server) {
    let cfg = make_config(T, Q_BITS, N, SecretDistribution::Ternary).expect("config should build");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let client = Client::new_with_rng(cfg.clone(), &mut rng);
    let server = Server::new(cfg);
    (client, server)
}

#[test]
fn encrypt_decrypt_round_trips_for_arbitrary_vectors() {
    let (client, _server) = setup(100);
    let mut rng = ChaCha8Rng::seed_from_u64(101);

    for v in [
        vec![0u64; N],
        vec![1, 2, 3, 4, 5, 6, 7, 8],
        vec![256, 255, 254, 0, 1, 2, 3, 4],
        (0..N as u64).map(|i| (i * 31 + 7) % T).collect(),
    ] {
        let ct = client.encrypt_with_rng(&v, &mut rng);
        assert_eq!(client.decrypt(&ct), v);
    }
}

#[test]
fn add_cc_is_componentwise_mod_t() {
    let (client, server) = setup(200);
    let mut rng = ChaCha8Rng::seed_from_u64(201);
    let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let v2: Vec<u64> = vec![2, 3, 4, 5, 4, 3, 2, 3];

    let c1 = client.encrypt_with_rng(&v1, &mut rng);
    let c2 = client.encrypt_with_rng(&v2, &mut rng);
    let sum = server.add_cc(&c1, &c2);

    let expected: Vec<u64> = v1.iter().zip(v2.iter()).map(|(&a, &b)| (a + b) % T).collect();
    assert_eq!(client.decrypt(&sum), expected);
    assert_eq!(expected, vec![3, 5, 7, 9, 9, 9, 9, 11]);
}

#[test]
fn add_cp_and_mul_cp_match_plain_arithmetic() {
    let (client, server) = setup(300);
    let mut rng = ChaCha8Rng::seed_from_u64(301);
    let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let p: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];

    let c1 = client.encrypt_with_rng(&v1, &mut rng);

    let added = server.add_cp(&c1, &p);
    let expected_add: Vec<u64> = v1.iter().zip(p.iter()).map(|(&a, &b)| (a + b) % T).collect();
    assert_eq!(client.decrypt(&added), expected_add);
    assert_eq!(expected_add, vec![2, 4, 6, 8, 10, 12, 14, 16]);

    let multiplied = server.mul_cp(&c1, &p);
    let expected_mul: Vec<u64> = v1.iter().zip(p.iter()).map(|(&a, &b)| (a * b) % T).collect();
    assert_eq!(client.decrypt(&multiplied), expected_mul);
    assert_eq!(expected_mul, vec![1, 4, 9, 16, 25, 36, 49, 64]);
}

#[test]
fn mul_cc_matches_plain_arithmetic_via_relinearization() {
    // mul_cc is the one path that emits per-stage `tracing::debug!` spans
    // (mod-raise, tensor, mod-switch, relinearize); surface them here so a
    // failing run shows which BEHZ stage diverged.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (client, server) = setup(400);
    let mut rng = ChaCha8Rng::seed_from_u64(401);
    let v1: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let v2: Vec<u64> = vec![2, 3, 4, 5, 4, 3, 2, 3];

    let c1 = client.encrypt_with_rng(&v1, &mut rng);
    let c2 = client.encrypt_with_rng(&v2, &mut rng);
    let product = server.mul_cc(&c1, &c2, client.relin_key());

    let expected: Vec<u64> = v1.iter().zip(v2.iter()).map(|(&a, &b)| (a * b) % T).collect();
    assert_eq!(client.decrypt(&product), expected);
    assert_eq!(expected, vec![2, 6, 12, 20, 20, 18, 14, 24]);
}

#[test]
fn two_encryptions_of_the_same_plaintext_differ_but_both_decrypt_correctly() {
    let (client, _server) = setup(500);
    let mut rng = ChaCha8Rng::seed_from_u64(501);
    let v: Vec<u64> = vec![9, 8, 7, 6, 5, 4, 3, 2];

    let c1 = client.encrypt_with_rng(&v, &mut rng);
    let c2 = client.encrypt_with_rng(&v, &mut rng);

    assert_ne!(c1.a().coeffs()[0].residues(), c2.a().coeffs()[0].residues());
    assert_eq!(client.decrypt(&c1), v);
    assert_eq!(client.decrypt(&c2), v);
}

#[test]
fn make_config_rejects_non_prime_plaintext_modulus() {
    let err = make_config(16, 100, 8, SecretDistribution::Binary).unwrap_err();
    assert_eq!(err, ring_bfv::error::ConfigError::PlaintextModulusNotPrime(16));
}

#[test]
fn chained_homomorphic_operations_stay_consistent() {
    // (v1 + v2) * p, mixing add_cc, then mul_cp.
    let (client, server) = setup(600);
    let mut rng = ChaCha8Rng::seed_from_u64(601);
    let v1: Vec<u64> = vec![1, 1, 1, 1, 1, 1, 1, 1];
    let v2: Vec<u64> = vec![2, 2, 2, 2, 2, 2, 2, 2];
    let p: Vec<u64> = vec![3, 3, 3, 3, 3, 3, 3, 3];

    let c1 = client.encrypt_with_rng(&v1, &mut rng);
    let c2 = client.encrypt_with_rng(&v2, &mut rng);
    let sum = server.add_cc(&c1, &c2);
    let result = server.mul_cp(&sum, &p);

    let expected: Vec<u64> = v1
        .iter()
        .zip(v2.iter())
        .zip(p.iter())
        .map(|((&a, &b), &c)| ((a + b) % T) * c % T)
        .collect();
    assert_eq!(client.decrypt(&result), expected);
    assert_eq!(expected, vec![9; 8]);
}
