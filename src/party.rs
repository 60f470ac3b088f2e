// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::{BigUint, RandBigInt};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::{MpcError, Result};
use crate::paillier::{Ciphertext, PartialDecryption, PublicKey, ThresholdKeyShare};
use crate::polynomial::Polynomial;
use crate::share::ShareStore;

/// A party represents one participant of the computation. It owns its
/// evaluation of every shared value, its slice of the Paillier decryption
/// key and the two Lagrange weights it applies when a value is opened.
#[derive(Debug)]
pub struct Party {
    /// Index in [0, N). The party evaluates sharings at `id + 1`.
    pub id: usize,
    pub key_share: ThresholdKeyShare,
    pub pk: PublicKey,
    pub field_modulus: BigUint,
    /// Lagrange weight at 0 for point `id + 1` among {1..T}
    pub beta_threshold: BigUint,
    /// Lagrange weight at 0 for point `id + 1` among {1..N}
    pub beta_full: BigUint,
    pub latency: Duration,
    store: Mutex<ShareStore>,
}

impl Party {
    pub fn new(
        id: usize,
        key_share: ThresholdKeyShare,
        pk: PublicKey,
        field_modulus: BigUint,
        beta_threshold: BigUint,
        beta_full: BigUint,
        latency: Duration,
    ) -> Self {
        Party {
            id,
            key_share,
            pk,
            field_modulus,
            beta_threshold,
            beta_full,
            latency,
            store: Mutex::new(ShareStore::new()),
        }
    }

    fn store(&self) -> MutexGuard<'_, ShareStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value this party holds under `id`.
    pub fn get(&self, id: usize) -> Result<BigUint> {
        self.store()
            .get(id)
            .cloned()
            .ok_or(MpcError::ShareNotFound { party: self.id, id })
    }

    pub fn set(&self, id: usize, value: BigUint) {
        self.store().insert(id, value % &self.field_modulus);
    }

    /// Adds a reshared contribution to the slot `id`.
    pub fn accumulate(&self, id: usize, value: &BigUint) {
        self.store().accumulate(id, value, &self.field_modulus);
    }

    pub fn clear(&self) {
        self.store().clear();
    }

    pub fn share_count(&self) -> usize {
        self.store().len()
    }

    pub fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    /// This party's weighted contribution to an opening of `id`:
    /// `value · beta_threshold mod P`.
    pub fn reveal_contribution(&self, id: usize) -> Result<BigUint> {
        self.simulate_latency();
        Ok(self.get(id)? * &self.beta_threshold % &self.field_modulus)
    }

    /// Splits `secret` into a fresh degree-(T−1) sharing, one evaluation per
    /// party.
    pub fn reshare(&self, secret: &BigUint, threshold: usize, num_parties: usize) -> Vec<BigUint> {
        Polynomial::random_with_secret(secret, threshold - 1, &self.field_modulus)
            .evaluate_at_parties(num_parties)
    }

    /// Local product of two stored values weighted for resharing,
    /// `v1 · v2 · beta_full mod P`.
    pub fn weighted_product(&self, a: usize, b: usize) -> Result<BigUint> {
        let p = &self.field_modulus;
        Ok(self.get(a)? * self.get(b)? % p * &self.beta_full % p)
    }

    /// Uniform sample below `bound`, this party's private contribution to a
    /// jointly random value.
    pub fn sample_below(&self, bound: &BigUint) -> BigUint {
        rand::thread_rng().gen_biguint_below(bound)
    }

    pub fn partial_decrypt(&self, ct: &Ciphertext) -> PartialDecryption {
        self.simulate_latency();
        self.key_share.partial_decrypt(&self.pk, ct)
    }
}
