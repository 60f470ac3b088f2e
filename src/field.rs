// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Arithmetic on Shamir shares over Z_P.
//!
//! Linear operations are local: every party combines its own evaluations and
//! stores the result under a fresh id. Multiplication reshares the weighted
//! local product, and an opening needs the first T parties.

use num_bigint::{BigInt, BigUint};
use num_traits::identities::Zero;
use num_traits::ToPrimitive;
use rayon::prelude::*;
use tracing::instrument;

use crate::error::{MpcError, Result};
use crate::mpc::Mpc;
use crate::party::Party;
use crate::share::{Share, JOINT_OWNER};
use crate::util::Util;

impl Mpc {
    /// Party 0 deals a fresh degree-(T−1) sharing of `value`.
    pub fn create_shares(&self, value: &BigUint) -> Share {
        self.deal(&self.parties[0], value)
    }

    /// Like [`Mpc::create_shares`] with party `dealer` as the dealer. The
    /// handle records the dealer as its owner.
    pub fn create_shares_from(&self, dealer: usize, value: &BigUint) -> Result<Share> {
        let dealer = self.parties.get(dealer).ok_or_else(|| {
            MpcError::InvalidParameters(format!(
                "dealer {} out of range for {} parties",
                dealer,
                self.num_parties()
            ))
        })?;
        Ok(self.deal(dealer, value))
    }

    fn deal(&self, dealer: &Party, value: &BigUint) -> Share {
        let evaluations = dealer.reshare(value, self.threshold, self.num_parties());
        let share = self.fresh_share(dealer.id);
        self.parties
            .par_iter()
            .zip(evaluations.into_par_iter())
            .for_each(|(party, evaluation)| {
                party.simulate_latency();
                party.set(share.id, evaluation);
            });
        share
    }

    /// Shares a signed value; negatives are stored as P − |value|.
    pub fn create_signed_shares(&self, value: &BigInt) -> Share {
        self.create_shares(&Util::reduce(value, &self.field_modulus))
    }

    /// The trivial sharing of a public constant: every party holds `value`.
    pub fn public_share(&self, value: &BigUint) -> Share {
        let share = self.fresh_share(JOINT_OWNER);
        let value = value % &self.field_modulus;
        self.parties
            .par_iter()
            .for_each(|party| party.set(share.id, value.clone()));
        share
    }

    pub fn add(&self, a: Share, b: Share) -> Result<Share> {
        self.local(a.party, |party| Ok(party.get(a.id)? + party.get(b.id)?))
    }

    pub fn sub(&self, a: Share, b: Share) -> Result<Share> {
        self.local(a.party, |party| {
            let p = &party.field_modulus;
            Ok(party.get(a.id)? + p - party.get(b.id)?)
        })
    }

    /// `a + c` for a public constant.
    pub fn add_c(&self, a: Share, c: &BigUint) -> Result<Share> {
        self.local(a.party, |party| Ok(party.get(a.id)? + c))
    }

    pub fn mult_c(&self, a: Share, c: &BigUint) -> Result<Share> {
        self.local(a.party, |party| Ok(party.get(a.id)? * (c % &party.field_modulus)))
    }

    /// `constant + Σ coefficient · share` in one local pass.
    pub fn linear_combination(
        &self,
        terms: &[(Share, BigUint)],
        constant: &BigUint,
    ) -> Result<Share> {
        let owner = terms.first().map_or(JOINT_OWNER, |(share, _)| share.party);
        self.local(owner, |party| {
            let p = &party.field_modulus;
            terms
                .iter()
                .try_fold(constant % p, |acc, (share, coefficient)| -> Result<BigUint> {
                    Ok((acc + party.get(share.id)? * (coefficient % p)) % p)
                })
        })
    }

    /// Sum of all given shares.
    pub fn sum(&self, shares: &[Share]) -> Result<Share> {
        let terms: Vec<(Share, BigUint)> = shares
            .iter()
            .map(|&share| (share, BigUint::from(1u32)))
            .collect();
        self.linear_combination(&terms, &BigUint::zero())
    }

    /// One-round multiplication. Every party reshares
    /// `v_a · v_b · beta_full` and each party adds up the N sharings it
    /// receives, which leaves a degree-(T−1) sharing of `a · b`.
    pub fn mult(&self, a: Share, b: Share) -> Result<Share> {
        let t = self.threshold;
        let n = self.num_parties();
        let contributions = self
            .parties
            .par_iter()
            .map(|party| -> Result<Vec<BigUint>> {
                party.simulate_latency();
                let weighted = party.weighted_product(a.id, b.id)?;
                Ok(party.reshare(&weighted, t, n))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.deliver(a.party, &contributions))
    }

    /// Opens `share` using the first T parties.
    pub fn reveal_share(&self, share: Share) -> Result<BigUint> {
        let p = &self.field_modulus;
        let contributions = self.parties[..self.threshold]
            .par_iter()
            .map(|party| party.reveal_contribution(share.id))
            .collect::<Result<Vec<_>>>()?;
        Ok(contributions
            .into_iter()
            .fold(BigUint::zero(), |acc, v| (acc + v) % p))
    }

    /// Opens `share` as a signed integer in (−P/2, P/2].
    pub fn reveal_signed(&self, share: Share) -> Result<BigInt> {
        Ok(Util::to_signed(&self.reveal_share(share)?, &self.field_modulus))
    }

    /// Opens `share` and decodes it as a signed fixed-point number with
    /// `scale` fractional bits.
    pub fn reveal_share_fp(&self, share: Share, scale: usize) -> Result<f64> {
        let value = self.reveal_signed(share)?;
        let value = value.to_f64().unwrap_or(f64::NAN);
        Ok(value / 2f64.powi(scale as i32))
    }

    pub fn copy_share(&self, share: Share) -> Result<Share> {
        self.local(share.party, |party| party.get(share.id))
    }

    /// Erases every party's store and restarts share ids at zero. Returns how
    /// many ids were issued since the previous reset. Handles created before
    /// the call become dangling.
    pub fn delete_all_shares(&self) -> usize {
        self.parties.par_iter().for_each(|party| party.clear());
        self.reset_ids()
    }

    /// Every party contributes a uniform value below `bound`; the secret is
    /// their sum mod P, so it lies below `N · bound` when that is under P.
    pub fn random_share(&self, bound: &BigUint) -> Share {
        let t = self.threshold;
        let n = self.num_parties();
        let contributions: Vec<Vec<BigUint>> = self
            .parties
            .par_iter()
            .map(|party| party.reshare(&party.sample_below(bound), t, n))
            .collect();
        self.deliver(JOINT_OWNER, &contributions)
    }

    /// Probabilistic truncation of a signed `k`-bit value `a`: returns
    /// ⌊a / 2^m⌋ or ⌊a / 2^m⌋ + 1.
    ///
    /// The low `m` bits are masked by solved bits r < 2^m and the rest by a
    /// statistical mask 2^m · r', r' < N · 2^{S+k−m}, before a single opening.
    #[instrument(level = "trace", skip(self))]
    pub fn trunc_pr(&self, a: Share, k: usize, m: usize) -> Result<Share> {
        if m == 0 {
            return self.copy_share(a);
        }
        if m >= k {
            return Err(MpcError::InvalidParameters(format!(
                "cannot truncate {} bits of a {}-bit value",
                m, k
            )));
        }
        let p = &self.field_modulus;
        let two_m = Util::pow2(m);

        let (_, r) = self.solved_bits(m)?;
        let noise = self.random_share(&Util::pow2(self.security_bits() + k - m));

        // a + 2^{k−1} + 2^m · r' + r
        let masked = self.linear_combination(
            &[
                (a, BigUint::from(1u32)),
                (noise, two_m.clone()),
                (r, BigUint::from(1u32)),
            ],
            &Util::pow2(k - 1),
        )?;
        let c = self.reveal_share(masked)? % &two_m;

        // (a − c + r) / 2^m
        let inverse = Util::mod_inverse(&two_m, p).ok_or(MpcError::NotInvertible)?;
        let shifted = self.linear_combination(
            &[(a, inverse.clone()), (r, inverse.clone())],
            &((p - c) * &inverse % p),
        )?;
        Ok(shifted)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Mpc, MpcParams};
    use num_bigint::{BigInt, BigUint};
    use std::time::Duration;

    fn mpc() -> Mpc {
        Mpc::new(MpcParams {
            num_parties: 5,
            threshold: 3,
            key_bits: 64,
            message_bits: 24,
            security_bits: 20,
            fp_precision_bits: 8,
            network_latency: Duration::from_millis(0),
            record_transcript: false,
            max_sampling_attempts: 64,
        })
        .unwrap()
    }

    #[test]
    fn test_linear_operations() {
        let mpc = mpc();
        let a = mpc.create_shares(&BigUint::from(1000u32));
        let b = mpc.create_shares(&BigUint::from(58u32));

        let sum = mpc.add(a, b).unwrap();
        assert_eq!(mpc.reveal_share(sum).unwrap(), BigUint::from(1058u32));

        let diff = mpc.sub(b, a).unwrap();
        assert_eq!(mpc.reveal_signed(diff).unwrap(), BigInt::from(-942));

        let scaled = mpc.mult_c(a, &BigUint::from(7u32)).unwrap();
        assert_eq!(mpc.reveal_share(scaled).unwrap(), BigUint::from(7000u32));

        let shifted = mpc.add_c(b, &BigUint::from(2u32)).unwrap();
        assert_eq!(mpc.reveal_share(shifted).unwrap(), BigUint::from(60u32));

        let combo = mpc
            .linear_combination(
                &[(a, BigUint::from(2u32)), (b, BigUint::from(3u32))],
                &BigUint::from(5u32),
            )
            .unwrap();
        assert_eq!(mpc.reveal_share(combo).unwrap(), BigUint::from(2179u32));
    }

    #[test]
    fn test_mult_composes() {
        let mpc = mpc();
        let a = mpc.create_shares(&BigUint::from(3u32));
        let mut acc = mpc.copy_share(a).unwrap();
        for _ in 0..10 {
            acc = mpc.mult(acc, a).unwrap();
        }
        assert_eq!(mpc.reveal_share(acc).unwrap(), BigUint::from(177147u32));
    }

    #[test]
    fn test_public_share_and_copy() {
        let mpc = mpc();
        let c = mpc.public_share(&BigUint::from(42u32));
        let copy = mpc.copy_share(c).unwrap();
        assert_ne!(c.id, copy.id);
        assert_eq!(mpc.reveal_share(copy).unwrap(), BigUint::from(42u32));
    }

    #[test]
    fn test_dealer_owns_derived_shares() {
        let mpc = mpc();
        let a = mpc.create_shares_from(3, &BigUint::from(6u32)).unwrap();
        let b = mpc.create_shares(&BigUint::from(7u32));
        assert_eq!(a.party, 3);
        assert_eq!(b.party, 0);

        let product = mpc.mult(a, b).unwrap();
        let shifted = mpc.add_c(product, &BigUint::from(1u32)).unwrap();
        assert_eq!(product.party, 3);
        assert_eq!(shifted.party, 3);
        assert_eq!(mpc.mult(b, a).unwrap().party, 0);
        assert_eq!(mpc.reveal_share(shifted).unwrap(), BigUint::from(43u32));

        assert!(mpc.create_shares_from(5, &BigUint::from(1u32)).is_err());
    }

    #[test]
    fn test_random_share_bound() {
        let mpc = mpc();
        let bound = BigUint::from(16u32);
        for _ in 0..10 {
            let r = mpc.random_share(&bound);
            assert!(mpc.reveal_share(r).unwrap() < BigUint::from(5u32 * 16));
        }
    }

    #[test]
    fn test_trunc_pr() {
        let mpc = mpc();
        for value in [1_000_000i64, -1_000_000, 4095, 0] {
            let a = mpc.create_signed_shares(&BigInt::from(value));
            let t = mpc.trunc_pr(a, 24, 8).unwrap();
            let got = mpc.reveal_signed(t).unwrap();
            let floor = BigInt::from(value.div_euclid(256));
            assert!(got == floor || got == &floor + 1, "{} -> {}", value, got);
        }
    }

    #[test]
    fn test_reveal_fp() {
        let mpc = mpc();
        let a = mpc.create_signed_shares(&BigInt::from(-640));
        assert_eq!(mpc.reveal_share_fp(a, 8).unwrap(), -2.5);
    }

    #[test]
    fn test_delete_all() {
        let mpc = mpc();
        let a = mpc.create_shares(&BigUint::from(1u32));
        let _ = mpc.add(a, a).unwrap();
        assert_eq!(mpc.delete_all_shares(), 2);
        assert_eq!(mpc.parties[0].share_count(), 0);
        assert!(mpc.reveal_share(a).is_err());
        assert_eq!(mpc.create_shares(&BigUint::from(1u32)).id, 0);
    }
}
