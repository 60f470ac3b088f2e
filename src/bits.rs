// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Secure circuits over shared bits.
//!
//! Bit vectors are little-endian: index 0 holds the least significant bit.
//! Every bit is a field share of 0 or 1.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::identities::{One, Zero};
use rayon::prelude::*;
use tracing::{instrument, warn};

use crate::error::{MpcError, Result};
use crate::interpolation::BooleanFunction;
use crate::mpc::Mpc;
use crate::share::{Share, Spk};
use crate::util::Util;

impl Mpc {
    /// One uniformly random shared bit.
    ///
    /// Squares a random a, opens a^2 and takes its root s. Since ±a are
    /// equally likely, a / s is a uniform ±1 and (a / s + 1) / 2 a uniform bit.
    fn random_bit(&self) -> Result<Share> {
        let p = &self.field_modulus;
        let half = Util::mod_inverse(&BigUint::from(2u32), p).ok_or(MpcError::NotInvertible)?;
        let attempts = self.params.max_sampling_attempts;
        for attempt in 1..=attempts {
            let a = self.random_share(p);
            let square = self.reveal_share(self.mult(a, a)?)?;
            if square.is_zero() {
                warn!(attempt, "random bit sampled zero, retrying");
                continue;
            }
            let root = Util::mod_sqrt(&square, p).ok_or(MpcError::NotInvertible)?;
            let root_inv = Util::mod_inverse(&root, p).ok_or(MpcError::NotInvertible)?;
            // (a · s^{-1} + 1) / 2
            return self.linear_combination(&[(a, root_inv * &half % p)], &half);
        }
        Err(MpcError::DegenerateSample {
            protocol: "random_bits",
            attempts,
        })
    }

    /// `m` independent random bits, sampled in parallel.
    pub fn random_bits(&self, m: usize) -> Result<Vec<Share>> {
        (0..m)
            .into_par_iter()
            .map(|_| self.random_bit())
            .collect()
    }

    /// A random nonzero sharing and a sharing of its inverse.
    pub fn random_invertible_share(&self) -> Result<(Share, Share)> {
        let p = &self.field_modulus;
        let attempts = self.params.max_sampling_attempts;
        for attempt in 1..=attempts {
            let a = self.random_share(p);
            let b = self.random_share(p);
            let c = self.reveal_share(self.mult(a, b)?)?;
            if c.is_zero() {
                warn!(attempt, "invertible share sampled zero, retrying");
                continue;
            }
            // a^{-1} = b · (ab)^{-1}
            let c_inv = Util::mod_inverse(&c, p).ok_or(MpcError::NotInvertible)?;
            return Ok((a, self.mult_c(b, &c_inv)?));
        }
        Err(MpcError::DegenerateSample {
            protocol: "random_invertible_share",
            attempts,
        })
    }

    /// `m` random bits together with a sharing of the integer they encode.
    pub fn solved_bits(&self, m: usize) -> Result<(Vec<Share>, Share)> {
        let bits = self.random_bits(m)?;
        let value = self.bits_to_integer(&bits)?;
        Ok((bits, value))
    }

    /// Σ bits_i · 2^i
    pub fn bits_to_integer(&self, bits: &[Share]) -> Result<Share> {
        let terms: Vec<(Share, BigUint)> = bits
            .iter()
            .enumerate()
            .map(|(i, &bit)| (bit, Util::pow2(i)))
            .collect();
        self.linear_combination(&terms, &BigUint::zero())
    }

    /// Public `value` as `width` shared bits. Bits above `width` are dropped.
    pub fn bits_from_public(&self, value: &BigUint, width: usize) -> Vec<Share> {
        let zero = self.public_share(&BigUint::zero());
        let one = self.public_share(&BigUint::one());
        (0..width)
            .map(|i| if (value >> i).is_odd() { one } else { zero })
            .collect()
    }

    /// 1 − bit
    fn bit_not(&self, bit: Share) -> Result<Share> {
        let minus_one = &self.field_modulus - BigUint::one();
        self.linear_combination(&[(bit, minus_one)], &BigUint::one())
    }

    pub fn reverse_bits(&self, bits: &[Share]) -> Vec<Share> {
        bits.iter().rev().copied().collect()
    }

    /// Pads `bits` with shared zeros up to `len`.
    pub fn make_equal_length(&self, bits: &[Share], len: usize) -> Vec<Share> {
        let mut padded = bits.to_vec();
        if padded.len() < len {
            let zero = self.public_share(&BigUint::zero());
            padded.resize(len, zero);
        }
        padded
    }

    /// Bit decomposition of a shared `a < 2^m`.
    ///
    /// Opens 2^K + 2^{K+S} + a − d + 2^m · r for solved bits d and a
    /// statistical mask r, then adds the low m public bits to the bits of d.
    #[instrument(level = "trace", skip(self, a))]
    pub fn bits_dec(&self, a: Share, m: usize) -> Result<Vec<Share>> {
        if m == 0 {
            return Err(MpcError::EmptyInput("bits_dec"));
        }
        let k = self.message_bits();
        if m > k {
            return Err(MpcError::InvalidParameters(format!(
                "cannot decompose {} bits with a {}-bit message space",
                m, k
            )));
        }
        let s = self.security_bits();
        let (solved, d) = self.solved_bits(m)?;
        let noise = self.random_share(&Util::pow2((s + k).saturating_sub(m)));

        let offset = Util::pow2(k) + Util::pow2(k + s);
        let masked = self.linear_combination(
            &[
                (a, BigUint::one()),
                (d, &self.field_modulus - BigUint::one()),
                (noise, Util::pow2(m)),
            ],
            &offset,
        )?;
        let opened = self.reveal_share(masked)? % Util::pow2(m);

        let public = self.bits_from_public(&opened, m + 1);
        let mut sum = self.bits_add(&public, &solved)?;
        sum.truncate(m);
        Ok(sum)
    }

    /// Prefix products `[x_0, x_0 x_1, …, x_0 ⋯ x_{n−1}]` in a constant number
    /// of rounds.
    ///
    /// With random invertible r_i, the opened c_i = r_i r_{i−1}^{-1} x_i
    /// telescope: r_i^{-1} · Π_{j≤i} c_j = Π_{j≤i} x_j.
    ///
    /// Every x_i must be nonzero. c_i is zero exactly when x_i is, so a zero
    /// element is visible to all parties.
    pub fn fan_in_mult(&self, elements: &[Share]) -> Result<Vec<Share>> {
        let n = elements.len();
        if n == 0 {
            return Err(MpcError::EmptyInput("fan_in_mult"));
        }
        if n == 1 {
            return Ok(elements.to_vec());
        }
        let p = &self.field_modulus;

        let pairs: Vec<(Share, Share)> = (0..n)
            .into_par_iter()
            .map(|_| self.random_invertible_share())
            .collect::<Result<_>>()?;

        let masks: Vec<Share> = (0..n)
            .into_par_iter()
            .map(|i| {
                if i == 0 {
                    Ok(pairs[0].0)
                } else {
                    self.mult(pairs[i].0, pairs[i - 1].1)
                }
            })
            .collect::<Result<_>>()?;

        let opened: Vec<BigUint> = masks
            .par_iter()
            .zip(elements.par_iter())
            .map(|(&mask, &x)| self.reveal_share(self.mult(mask, x)?))
            .collect::<Result<_>>()?;

        let mut result = Vec::with_capacity(n);
        result.push(elements[0]);
        let mut acc = opened[0].clone();
        for i in 1..n {
            acc = acc * &opened[i] % p;
            result.push(self.mult_c(pairs[i].1, &acc)?);
        }
        Ok(result)
    }

    /// `result[j] = bits[0] ∨ … ∨ bits[j]` in O(√n) rounds.
    ///
    /// The bits are laid out row by row in a λ×λ grid, λ = ⌈√n⌉. The first
    /// row holding a one is found from prefix ORs of the row ORs; its bits
    /// are extracted with the one-hot row selector f and prefix-ORed again.
    #[instrument(level = "trace", skip_all, fields(n = bits.len()))]
    pub fn bits_prefix_or(&self, bits: &[Share]) -> Result<Vec<Share>> {
        let degree = bits.len();
        if degree == 0 {
            return Err(MpcError::EmptyInput("bits_prefix_or"));
        }
        let mut lambda = 1;
        while lambda * lambda < degree {
            lambda += 1;
        }
        let grid = self.make_equal_length(bits, lambda * lambda);
        let row = |i: usize| &grid[i * lambda..(i + 1) * lambda];

        let row_or: Vec<Share> = (0..lambda)
            .into_par_iter()
            .map(|i| self.bits_or(row(i)))
            .collect::<Result<_>>()?;

        // row_res[i] = row_or[0] ∨ … ∨ row_or[i]
        let row_res: Vec<Share> = (0..lambda)
            .into_par_iter()
            .map(|i| {
                if i == 0 {
                    Ok(row_or[0])
                } else {
                    self.bits_or(&row_or[..=i])
                }
            })
            .collect::<Result<_>>()?;

        // f[i] = 1 only for the first row containing a one
        let mut f = Vec::with_capacity(lambda);
        f.push(row_or[0]);
        for i in 1..lambda {
            f.push(self.sub(row_res[i], row_res[i - 1])?);
        }

        // g[j] = column j of the selected row
        let g: Vec<Share> = (0..lambda)
            .into_par_iter()
            .map(|j| {
                let products: Vec<Share> = (0..lambda)
                    .map(|i| self.mult(grid[i * lambda + j], f[i]))
                    .collect::<Result<_>>()?;
                self.sum(&products)
            })
            .collect::<Result<_>>()?;

        let b: Vec<Share> = (0..lambda)
            .into_par_iter()
            .map(|j| {
                if j == 0 {
                    Ok(g[0])
                } else {
                    self.bits_or(&g[..=j])
                }
            })
            .collect::<Result<_>>()?;

        // s[i] = 1 for every row past the first one holding a one
        let s: Vec<Share> = (0..lambda)
            .map(|i| self.sub(row_res[i], f[i]))
            .collect::<Result<_>>()?;

        (0..degree)
            .into_par_iter()
            .map(|idx| {
                let (i, j) = (idx / lambda, idx % lambda);
                self.add(self.mult(b[j], f[i])?, s[i])
            })
            .collect()
    }

    /// Evaluates a symmetric boolean function as a polynomial in
    /// s = 1 + Σ bits, with the powers of s from one fan-in multiplication.
    pub fn symmetric_boolean_function(
        &self,
        bits: &[Share],
        function: BooleanFunction,
    ) -> Result<Share> {
        let n = bits.len();
        if n == 0 {
            return Err(MpcError::EmptyInput("symmetric_boolean_function"));
        }
        let p = &self.field_modulus;
        let coefficients = self
            .interpolation()
            .coefficients(function, n, p)
            .ok_or(MpcError::NotInvertible)?;

        let terms: Vec<(Share, BigUint)> = bits.iter().map(|&b| (b, BigUint::one())).collect();
        let s = self.linear_combination(&terms, &BigUint::one())?;
        let powers = self.fan_in_mult(&vec![s; n + 1])?;

        let weighted: Vec<(Share, BigUint)> = (1..=n)
            .map(|i| (powers[i - 1], coefficients[i].clone()))
            .collect();
        self.linear_combination(&weighted, &coefficients[0])
    }

    pub fn bits_or(&self, bits: &[Share]) -> Result<Share> {
        self.symmetric_boolean_function(bits, BooleanFunction::Or)
    }

    pub fn bits_xor(&self, bits: &[Share]) -> Result<Share> {
        self.symmetric_boolean_function(bits, BooleanFunction::Xor)
    }

    pub fn bits_and(&self, bits: &[Share]) -> Result<Share> {
        let (first, rest) = bits
            .split_first()
            .ok_or(MpcError::EmptyInput("bits_and"))?;
        rest.iter()
            .try_fold(*first, |acc, &bit| self.mult(acc, bit))
    }

    /// Combines the spk tuples of positions 0..n into the tuple of the whole
    /// block: propagate iff every position propagates, kill iff some position
    /// kills and everything above it propagates, set otherwise.
    pub fn bits_spk(&self, tuples: &[Spk]) -> Result<Spk> {
        let size = tuples.len();
        if size == 0 {
            return Err(MpcError::EmptyInput("bits_spk"));
        }
        // pre_and[i] = p_i ∧ … ∧ p_{size−1} = ¬(¬p_i ∨ … ∨ ¬p_{size−1}).
        // Propagate bits may be zero, which fan_in_mult must not see.
        let negated_from_top: Vec<Share> = tuples
            .iter()
            .rev()
            .map(|tuple| self.bit_not(tuple.p))
            .collect::<Result<_>>()?;
        let pre_and: Vec<Share> = self
            .bits_prefix_or(&negated_from_top)?
            .into_iter()
            .rev()
            .map(|any_stop| self.bit_not(any_stop))
            .collect::<Result<_>>()?;

        let kills: Vec<Share> = (0..size)
            .into_par_iter()
            .map(|i| {
                if i + 1 == size {
                    Ok(tuples[i].k)
                } else {
                    self.mult(tuples[i].k, pre_and[i + 1])
                }
            })
            .collect::<Result<_>>()?;

        let k = self.sum(&kills)?;
        let p = pre_and[0];
        let minus_one = &self.field_modulus - BigUint::one();
        let s = self.linear_combination(
            &[(p, minus_one.clone()), (k, minus_one)],
            &BigUint::one(),
        )?;
        Ok(Spk { s, p, k })
    }

    /// Combined tuple of every prefix 0..=i, all prefixes in parallel.
    pub fn bits_prefix_spk(&self, tuples: &[Spk]) -> Result<Vec<Spk>> {
        (0..tuples.len())
            .into_par_iter()
            .map(|i| self.bits_spk(&tuples[..=i]))
            .collect()
    }

    /// Carry out of every position of a + b. The shorter operand is padded
    /// with zeros.
    pub fn bits_carries(&self, a: &[Share], b: &[Share]) -> Result<Vec<Share>> {
        let degree = a.len().max(b.len());
        if degree == 0 {
            return Err(MpcError::EmptyInput("bits_carries"));
        }
        let a = self.make_equal_length(a, degree);
        let b = self.make_equal_length(b, degree);
        let minus_one = &self.field_modulus - BigUint::one();
        let minus_two = &self.field_modulus - BigUint::from(2u32);
        let tuples: Vec<Spk> = a
            .par_iter()
            .zip(b.par_iter())
            .map(|(&ai, &bi)| -> Result<Spk> {
                let s = self.mult(ai, bi)?;
                // a ⊕ b
                let p = self.linear_combination(
                    &[
                        (ai, BigUint::one()),
                        (bi, BigUint::one()),
                        (s, minus_two.clone()),
                    ],
                    &BigUint::zero(),
                )?;
                let k = self.linear_combination(
                    &[(s, minus_one.clone()), (p, minus_one.clone())],
                    &BigUint::one(),
                )?;
                Ok(Spk { s, p, k })
            })
            .collect::<Result<_>>()?;

        Ok(self
            .bits_prefix_spk(&tuples)?
            .into_iter()
            .map(|tuple| tuple.s)
            .collect())
    }

    /// Bits of a + b, one longer than the longer operand.
    #[instrument(level = "trace", skip_all, fields(la = a.len(), lb = b.len()))]
    pub fn bits_add(&self, a: &[Share], b: &[Share]) -> Result<Vec<Share>> {
        let degree = a.len().max(b.len());
        if degree == 0 {
            return Err(MpcError::EmptyInput("bits_add"));
        }
        let a = self.make_equal_length(a, degree);
        let b = self.make_equal_length(b, degree);
        let carries = self.bits_carries(&a, &b)?;
        let minus_two = &self.field_modulus - BigUint::from(2u32);

        let mut sum: Vec<Share> = (0..degree)
            .into_par_iter()
            .map(|i| {
                // a_i + b_i + c_{i−1} − 2 c_i
                let mut terms = vec![
                    (a[i], BigUint::one()),
                    (b[i], BigUint::one()),
                    (carries[i], minus_two.clone()),
                ];
                if i > 0 {
                    terms.push((carries[i - 1], BigUint::one()));
                }
                self.linear_combination(&terms, &BigUint::zero())
            })
            .collect::<Result<_>>()?;
        sum.push(carries[degree - 1]);
        Ok(sum)
    }

    /// Shared 1 iff a < b. Equal inputs give 0.
    ///
    /// Squared differences, most significant first, are prefix-ORed; the
    /// difference of neighbouring prefixes marks the first position where
    /// the inputs differ, and b's bit there is the answer.
    #[instrument(level = "trace", skip_all, fields(la = a.len(), lb = b.len()))]
    pub fn bits_lt(&self, a: &[Share], b: &[Share]) -> Result<Share> {
        let degree = a.len().max(b.len());
        if degree == 0 {
            return Err(MpcError::EmptyInput("bits_lt"));
        }
        let a = self.make_equal_length(a, degree);
        let b = self.make_equal_length(b, degree);

        let differences: Vec<Share> = (0..degree)
            .into_par_iter()
            .map(|i| {
                let j = degree - 1 - i;
                let d = self.sub(a[j], b[j])?;
                self.mult(d, d)
            })
            .collect::<Result<_>>()?;

        let f = self.bits_prefix_or(&differences)?;
        let mut first_difference = Vec::with_capacity(degree);
        first_difference.push(f[0]);
        for i in 1..degree {
            first_difference.push(self.sub(f[i], f[i - 1])?);
        }

        let selected: Vec<Share> = (0..degree)
            .into_par_iter()
            .map(|i| self.mult(first_difference[degree - 1 - i], b[i]))
            .collect::<Result<_>>()?;
        self.sum(&selected)
    }

    /// Shift-and-add product; the result has `len(a) + len(b)` bits.
    pub fn bits_mult(&self, a: &[Share], b: &[Share]) -> Result<Vec<Share>> {
        if a.is_empty() || b.is_empty() {
            return Err(MpcError::EmptyInput("bits_mult"));
        }
        let width = a.len() + b.len();
        let zero = self.public_share(&BigUint::zero());

        // partial[i] = (a_i · b) << i
        let partials: Vec<Vec<Share>> = (0..a.len())
            .into_par_iter()
            .map(|i| -> Result<Vec<Share>> {
                let mut row = vec![zero; i];
                for &bj in b {
                    row.push(self.mult(a[i], bj)?);
                }
                row.resize(width, zero);
                Ok(row)
            })
            .collect::<Result<_>>()?;

        let mut partials = partials.into_iter();
        let mut acc = partials.next().unwrap_or_default();
        for row in partials {
            acc = self.bits_add(&acc, &row)?;
            acc.truncate(width);
        }
        Ok(acc)
    }

    /// 2^x for x = Σ bits_i 2^i, as Π (1 + (2^{2^i} − 1) · bits_i). The
    /// result is reduced mod P, so x should stay below log2 P.
    pub fn bits_exp(&self, bits: &[Share]) -> Result<Share> {
        if bits.is_empty() {
            return Err(MpcError::EmptyInput("bits_exp"));
        }
        let p = &self.field_modulus;
        let factors: Vec<Share> = bits
            .par_iter()
            .enumerate()
            .map(|(i, &bit)| {
                let power = BigUint::from(2u32).modpow(&Util::pow2(i), p);
                let scale = (power + p - BigUint::one()) % p;
                self.linear_combination(&[(bit, scale)], &BigUint::one())
            })
            .collect::<Result<_>>()?;
        let prefix = self.fan_in_mult(&factors)?;
        Ok(prefix[prefix.len() - 1])
    }
}
