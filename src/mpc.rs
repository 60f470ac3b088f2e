// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::BigUint;
use num_traits::identities::Zero;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::{MpcError, Result};
use crate::interpolation::{lagrange_weight, InterpolationCache};
use crate::paillier::{self, PublicKey, ThresholdContext};
use crate::params::MpcParams;
use crate::party::Party;
use crate::share::{Share, ShareIdAllocator};
use crate::transcript::Transcript;
use crate::util::Util;

/// The coordinator every application talks to.
///
/// It simulates all N parties in one process, runs each protocol round as one
/// parallel fan-out over the parties and owns the state the parties share:
/// the share id allocator, the interpolation cache and the transcript.
///
/// ## Example
///
/// ```rust,no_run
/// use custodes_rs::{Mpc, MpcParams};
/// use num_bigint::BigUint;
///
/// let mpc = Mpc::new(MpcParams::default()).unwrap();
/// let a = mpc.create_shares(&BigUint::from(5u32));
/// let b = mpc.create_shares(&BigUint::from(3u32));
/// let product = mpc.mult(a, b).unwrap();
/// assert_eq!(mpc.reveal_share(product).unwrap(), BigUint::from(15u32));
/// ```
#[derive(Debug)]
pub struct Mpc {
    pub parties: Vec<Party>,
    pub threshold: usize,
    pub pk: PublicKey,
    pub field_modulus: BigUint,
    pub params: MpcParams,
    decryption: ThresholdContext,
    ids: ShareIdAllocator,
    interpolation: InterpolationCache,
    transcript: Transcript,
}

impl Mpc {
    /// Validates `params`, generates the threshold Paillier key and the field
    /// prime and hands every party its key share and Lagrange weights.
    #[instrument(skip(params), fields(n = params.num_parties, t = params.threshold))]
    pub fn new(params: MpcParams) -> Result<Self> {
        params.validate()?;
        let n = params.num_parties;
        let t = params.threshold;

        let (pk, decryption, key_shares) = paillier::keygen(params.key_bits, n, t)?;
        let field_modulus = Util::prime_with_bits(params.field_bits());
        debug!(
            paillier_bits = pk.n.bits(),
            field_bits = field_modulus.bits(),
            "keys generated"
        );

        let parties = key_shares
            .into_iter()
            .enumerate()
            .map(|(i, key_share)| -> Result<Party> {
                // only the first T parties take part in an opening
                let beta_threshold = if i < t {
                    lagrange_weight(i + 1, t, &field_modulus).ok_or(MpcError::NotInvertible)?
                } else {
                    BigUint::zero()
                };
                let beta_full =
                    lagrange_weight(i + 1, n, &field_modulus).ok_or(MpcError::NotInvertible)?;
                Ok(Party::new(
                    i,
                    key_share,
                    pk.clone(),
                    field_modulus.clone(),
                    beta_threshold,
                    beta_full,
                    params.network_latency,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Mpc {
            parties,
            threshold: t,
            pk,
            field_modulus,
            decryption,
            ids: ShareIdAllocator::new(),
            interpolation: InterpolationCache::new(),
            transcript: Transcript::new(params.record_transcript),
            params,
        })
    }

    pub fn num_parties(&self) -> usize {
        self.parties.len()
    }

    /// K
    pub fn message_bits(&self) -> usize {
        self.params.message_bits
    }

    /// S
    pub fn security_bits(&self) -> usize {
        self.params.security_bits
    }

    /// F
    pub fn fp_precision_bits(&self) -> usize {
        self.params.fp_precision_bits
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn interpolation(&self) -> &InterpolationCache {
        &self.interpolation
    }

    pub(crate) fn decryption(&self) -> &ThresholdContext {
        &self.decryption
    }

    /// Ids issued since setup or the last `delete_all_shares`.
    pub fn issued_share_ids(&self) -> usize {
        self.ids.issued()
    }

    /// Warms the OR interpolation cache for every length up to K, the widest
    /// bit vector the division engine produces.
    pub fn precompute(&self) {
        self.interpolation
            .precompute(self.message_bits() + 1, &self.field_modulus);
        debug!(entries = self.interpolation.len(), "interpolation cache ready");
    }

    pub(crate) fn fresh_share(&self, owner: usize) -> Share {
        Share::new(owner, self.ids.next())
    }

    pub(crate) fn reset_ids(&self) -> usize {
        self.ids.reset()
    }

    /// Runs a communication-free step: every party derives its value for the
    /// new share from what it already holds. The result belongs to `owner`.
    pub(crate) fn local<F>(&self, owner: usize, f: F) -> Result<Share>
    where
        F: Fn(&Party) -> Result<BigUint> + Sync,
    {
        let share = self.fresh_share(owner);
        self.parties.par_iter().try_for_each(|party| {
            let value = f(party)?;
            party.set(share.id, value);
            Ok(())
        })?;
        Ok(share)
    }

    /// Delivers a set of resharings: `contributions[i][j]` is what party i
    /// sends to party j. Every party sums what it receives under one id.
    pub(crate) fn deliver(&self, owner: usize, contributions: &[Vec<BigUint>]) -> Share {
        let share = self.fresh_share(owner);
        self.parties.par_iter().for_each(|party| {
            party.simulate_latency();
            for row in contributions {
                party.accumulate(share.id, &row[party.id]);
            }
        });
        share
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn params() -> MpcParams {
        MpcParams {
            num_parties: 3,
            threshold: 2,
            key_bits: 64,
            message_bits: 24,
            security_bits: 20,
            fp_precision_bits: 8,
            network_latency: Duration::from_millis(0),
            record_transcript: false,
            max_sampling_attempts: 64,
        }
    }

    #[test]
    fn test_setup() {
        let mpc = Mpc::new(params()).unwrap();
        assert_eq!(mpc.num_parties(), 3);
        assert!(mpc.field_modulus.bits() > 64);
        assert!(num_primes::Verification::is_prime(&mpc.field_modulus));
        assert!(mpc.parties[2].beta_threshold.is_zero());

        // beta_threshold over {1, 2} is (2, -1)
        let p = &mpc.field_modulus;
        assert_eq!(mpc.parties[0].beta_threshold, BigUint::from(2u32));
        assert_eq!(mpc.parties[1].beta_threshold, p - BigUint::from(1u32));
    }

    #[test]
    fn test_moduli_have_full_length() {
        let params = params();
        for _ in 0..8 {
            let mpc = Mpc::new(params.clone()).unwrap();
            assert!(mpc.field_modulus.bits() >= params.field_bits());
            assert!(mpc.pk.n.bits() >= 2 * params.key_bits);

            // a double-width truncation wraps if P is shorter than planned
            let a = mpc.create_shares(&Util::pow2(40));
            let t = mpc.reveal_share(mpc.trunc_pr(a, 48, 24).unwrap()).unwrap();
            assert!(t == Util::pow2(16) || t == Util::pow2(16) + 1u32, "got {}", t);
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let bad = MpcParams {
            threshold: 3,
            ..params()
        };
        assert!(matches!(
            Mpc::new(bad),
            Err(MpcError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_precompute_fills_cache() {
        let mpc = Mpc::new(params()).unwrap();
        assert!(mpc.interpolation().is_empty());
        mpc.precompute();
        assert_eq!(mpc.interpolation().len(), 24);
    }
}
