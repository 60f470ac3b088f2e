// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Fixed-point reciprocal, division and inverse square root on field
//! shares.
//!
//! Inputs and outputs carry F fractional bits. Internally values are scaled
//! by 2^K, K the message width, and every product is truncated back with
//! [`Mpc::trunc_pr`].

use num_bigint::BigUint;
use num_traits::identities::{One, Zero};
use tracing::{debug, instrument};

use crate::error::{MpcError, Result};
use crate::homomorphic::encode_fixed_point;
use crate::mpc::Mpc;
use crate::share::Share;
use crate::util::Util;

/// Linear seed 2.9142 − 2x ≈ 1/x on [0.5, 1).
const RECIPROCAL_SEED: f64 = 2.9142;

/// √(2/3), scale of the inverse square root seed.
const SQRT_RECIPROCAL_SEED: f64 = 0.816_496_580_927_726;

impl Mpc {
    /// Number of Goldschmidt rounds, ⌈log2(K / 3.75)⌉.
    pub fn goldschmidt_rounds(&self) -> usize {
        let rounds = (self.message_bits() as f64 / 3.75).log2().ceil();
        if rounds < 1.0 {
            1
        } else {
            rounds as usize
        }
    }

    /// Shared one-hot vector marking the top set bit of `b < 2^K`, all zero
    /// when b is.
    fn top_bit_one_hot(&self, b: Share) -> Result<Vec<Share>> {
        let k = self.message_bits();
        let bits = self.bits_dec(b, k)?;

        // above[i] = bits[i] ∨ … ∨ bits[K−1]
        let above = self.reverse_bits(&self.bits_prefix_or(&self.reverse_bits(&bits))?);
        let mut one_hot = Vec::with_capacity(k);
        for i in 0..k - 1 {
            one_hot.push(self.sub(above[i], above[i + 1])?);
        }
        one_hot.push(above[k - 1]);
        Ok(one_hot)
    }

    /// Returns (u, v) with v = 2^{K−1−p} for the top set bit p of `b` and
    /// u = b · v in [2^{K−1}, 2^K). Both are zero when b is.
    pub fn fp_normalize(&self, b: Share) -> Result<(Share, Share)> {
        let k = self.message_bits();
        let terms: Vec<(Share, BigUint)> = self
            .top_bit_one_hot(b)?
            .into_iter()
            .enumerate()
            .map(|(i, bit)| (bit, Util::pow2(k - 1 - i)))
            .collect();
        let v = self.linear_combination(&terms, &BigUint::zero())?;
        let u = self.mult(b, v)?;
        Ok((u, v))
    }

    /// w ≈ 2^K / b, from the seed (2.9142 − 2u/2^K) · v.
    pub fn init_reciprocal(&self, b: Share) -> Result<Share> {
        let k = self.message_bits();
        let (u, v) = self.fp_normalize(b)?;
        let alpha = encode_fixed_point(RECIPROCAL_SEED, k)?
            .to_biguint()
            .ok_or_else(|| MpcError::InvalidParameters("negative seed".to_string()))?;
        let minus_two = &self.field_modulus - BigUint::from(2u32);
        let seed = self.linear_combination(&[(u, minus_two)], &alpha)?;
        let w = self.mult(seed, v)?;
        self.trunc_pr(w, 2 * k, k)
    }

    /// a / b by Goldschmidt iteration.
    ///
    /// With w ≈ 2^K / b and x = 2^K − b·w the relative error of w scaled by
    /// 2^K, each round multiplies y by (1 + x) and squares x, so the error
    /// shrinks quadratically. y carries K/2 fractional bits until the last
    /// truncation brings it to F.
    ///
    /// Needs b > 0 below 2^K and a/b below 2^{K/2−2}.
    #[instrument(level = "debug", skip(self, a, b))]
    pub fn fp_division(&self, a: Share, b: Share) -> Result<Share> {
        let k = self.message_bits();
        let f = self.fp_precision_bits();
        let half = k / 2;
        if 2 * f > k {
            return Err(MpcError::InvalidParameters(format!(
                "{} fractional bits exceed half of K = {}",
                f, k
            )));
        }
        let theta = self.goldschmidt_rounds();
        let one = Util::pow2(k);
        let minus_one = &self.field_modulus - BigUint::one();

        let w = self.init_reciprocal(b)?;
        let bw = self.mult(b, w)?;
        let mut x = self.linear_combination(&[(bw, minus_one)], &one)?;
        let mut y = self.trunc_pr(self.mult(a, w)?, 2 * k, half)?;

        for round in 0..theta {
            let factor = self.add_c(x, &one)?;
            y = self.trunc_pr(self.mult(y, factor)?, 2 * k, k)?;
            if round + 1 < theta {
                x = self.trunc_pr(self.mult(x, x)?, 2 * k, k)?;
            }
        }
        debug!(rounds = theta, "goldschmidt iteration done");
        self.trunc_pr(y, 2 * k, half - f)
    }

    /// 1 / b with F fractional bits.
    pub fn fp_reciprocal(&self, b: Share) -> Result<Share> {
        let one = self.public_share(&Util::pow2(self.fp_precision_bits()));
        self.fp_division(one, b)
    }

    /// y0 ≈ 1 / √a with K/2 fractional bits, for `a > 0` carrying F.
    ///
    /// With the top set bit of a at p, a lies in [2^{p−F}, 2^{p−F+1}) and
    /// y0 = c · 2^{−(p−F)/2}, which puts a · y0^2 in [2/3, 4/3).
    pub fn init_sqrt_reciprocal(&self, a: Share) -> Result<Share> {
        let half = self.message_bits() / 2;
        let f = self.fp_precision_bits() as i32;
        let terms = self
            .top_bit_one_hot(a)?
            .into_iter()
            .enumerate()
            .map(|(i, bit)| -> Result<(Share, BigUint)> {
                let seed = SQRT_RECIPROCAL_SEED * 2f64.powf(-f64::from(i as i32 - f) / 2.0);
                let seed = encode_fixed_point(seed, half)?
                    .to_biguint()
                    .ok_or_else(|| MpcError::InvalidParameters("negative seed".to_string()))?;
                Ok((bit, seed))
            })
            .collect::<Result<Vec<_>>>()?;
        self.linear_combination(&terms, &BigUint::zero())
    }

    /// 1 / √a for a fixed-point `a > 0`, with F fractional bits.
    ///
    /// Goldschmidt iteration on b = a and y = y0: each round sets
    /// b ← b · y^2, y ← (3 − b) / 2 and z ← z · y, so b tends to 1 and
    /// z = y0 · y1 ⋯ to 1 / √a. Intermediates carry K/2 fractional bits.
    ///
    /// Needs a > 0 below 2^{K/2−2}; larger inputs lose y^2 to truncation.
    #[instrument(level = "debug", skip(self, a))]
    pub fn fp_sqrt_reciprocal(&self, a: Share) -> Result<Share> {
        let k = self.message_bits();
        let f = self.fp_precision_bits();
        let half = k / 2;
        if 2 * f > k {
            return Err(MpcError::InvalidParameters(format!(
                "{} fractional bits exceed half of K = {}",
                f, k
            )));
        }
        let theta = self.goldschmidt_rounds();
        let three = Util::pow2(half) * BigUint::from(3u32);
        let minus_one = &self.field_modulus - BigUint::one();

        let mut b = self.mult_c(a, &Util::pow2(half - f))?;
        let mut y = self.init_sqrt_reciprocal(a)?;
        let mut z = y;
        for _ in 0..theta {
            let y2 = self.trunc_pr(self.mult(y, y)?, 2 * k, half)?;
            b = self.trunc_pr(self.mult(b, y2)?, 2 * k, half)?;
            let twice = self.linear_combination(&[(b, minus_one.clone())], &three)?;
            y = self.trunc_pr(twice, 2 * k, 1)?;
            z = self.trunc_pr(self.mult(z, y)?, 2 * k, half)?;
        }
        debug!(rounds = theta, "inverse square root done");
        self.trunc_pr(z, 2 * k, half - f)
    }

    /// Shared 1 iff the signed value `a` in [−2^{K−1}, 2^{K−1}) is negative.
    pub fn sign_bit(&self, a: Share) -> Result<Share> {
        let k = self.message_bits();
        let shifted = self.add_c(a, &Util::pow2(k - 1))?;
        let bits = self.bits_dec(shifted, k)?;
        // a < 0 exactly when a + 2^{K−1} has its top bit clear
        let minus_one = &self.field_modulus - BigUint::one();
        self.linear_combination(&[(bits[k - 1], minus_one)], &BigUint::one())
    }
}

#[cfg(test)]
mod tests {
    use crate::homomorphic::encode_fixed_point;
    use crate::{Mpc, MpcParams};
    use num_bigint::{BigInt, BigUint};
    use std::time::Duration;

    fn mpc() -> Mpc {
        Mpc::new(MpcParams {
            num_parties: 3,
            threshold: 2,
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

    fn fp_share(mpc: &Mpc, x: f64) -> crate::Share {
        mpc.create_signed_shares(&encode_fixed_point(x, 8).unwrap())
    }

    #[test]
    fn test_rounds() {
        let mpc = mpc();
        // ⌈log2(24 / 3.75)⌉ = ⌈2.68⌉
        assert_eq!(mpc.goldschmidt_rounds(), 3);
    }

    #[test]
    fn test_normalize() {
        let mpc = mpc();
        for value in [1u32, 5, 1000, 4_000_000] {
            let b = mpc.create_shares(&BigUint::from(value));
            let (u, v) = mpc.fp_normalize(b).unwrap();
            let u = mpc.reveal_share(u).unwrap();
            let v = mpc.reveal_share(v).unwrap();
            let top = 32 - value.leading_zeros() as usize - 1;
            assert_eq!(v, BigUint::from(1u32) << (23 - top));
            assert_eq!(u, BigUint::from(value) * &v);
            assert!(u >= BigUint::from(1u32 << 23) && u < BigUint::from(1u32 << 24));
        }
    }

    #[test]
    fn test_division() {
        let mpc = mpc();
        for (a, b) in [(10.0, 4.0), (1.0, 3.0), (7.5, 0.5), (100.0, 64.0)] {
            let q = mpc.fp_division(fp_share(&mpc, a), fp_share(&mpc, b)).unwrap();
            let got = mpc.reveal_share_fp(q, 8).unwrap();
            assert!((got - a / b).abs() <= 4.0 / 256.0, "{} / {} = {}", a, b, got);
        }
    }

    #[test]
    fn test_division_by_itself() {
        let mpc = mpc();
        let a = fp_share(&mpc, 13.25);
        let q = mpc.fp_division(a, a).unwrap();
        let got = mpc.reveal_share_fp(q, 8).unwrap();
        assert!((got - 1.0).abs() <= 4.0 / 256.0, "got {}", got);
    }

    #[test]
    fn test_reciprocal() {
        let mpc = mpc();
        let r = mpc.fp_reciprocal(fp_share(&mpc, 8.0)).unwrap();
        let got = mpc.reveal_share_fp(r, 8).unwrap();
        assert!((got - 0.125).abs() <= 4.0 / 256.0, "got {}", got);
    }

    #[test]
    fn test_sqrt_reciprocal() {
        let mpc = mpc();
        for x in [4.0, 2.0, 0.25, 9.0, 100.0, 1.0] {
            let r = mpc.fp_sqrt_reciprocal(fp_share(&mpc, x)).unwrap();
            let got = mpc.reveal_share_fp(r, 8).unwrap();
            let want = 1.0 / f64::sqrt(x);
            assert!((got - want).abs() <= 4.0 / 256.0, "1/sqrt({}) = {}", x, got);
        }
    }

    #[test]
    fn test_sqrt_reciprocal_seed() {
        let mpc = mpc();
        for x in [0.5, 3.0, 1000.0] {
            let y0 = mpc.init_sqrt_reciprocal(fp_share(&mpc, x)).unwrap();
            let y0 = mpc.reveal_share_fp(y0, 12).unwrap();
            let b = x * y0 * y0;
            assert!(b > 0.6 && b < 1.4, "x = {}, x·y0² = {}", x, b);
        }
    }

    #[test]
    fn test_sign_bit() {
        let mpc = mpc();
        for value in [-5i64, 0, 7, -(1 << 23), (1 << 23) - 1] {
            let a = mpc.create_signed_shares(&BigInt::from(value));
            let sign = mpc.reveal_share(mpc.sign_bit(a).unwrap()).unwrap();
            assert_eq!(sign, BigUint::from((value < 0) as u32), "{}", value);
        }
    }
}
