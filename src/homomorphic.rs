// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Interactive protocols on Paillier ciphertexts.

use num_bigint::{BigInt, BigUint};
use num_traits::{FromPrimitive, One, ToPrimitive};
use rayon::prelude::*;
use tracing::instrument;

use crate::error::{MpcError, Result};
use crate::mpc::Mpc;
use crate::paillier::{Ciphertext, PartialDecryption};
use crate::transcript::ProtocolKind;
use crate::util::Util;

/// ⌊x · 2^prec⌋ as a signed integer. Fails on NaN and infinities.
pub fn encode_fixed_point(x: f64, prec: usize) -> Result<BigInt> {
    BigInt::from_f64((x * 2f64.powi(prec as i32)).floor())
        .ok_or_else(|| MpcError::InvalidParameters(format!("cannot encode {} as fixed point", x)))
}

/// Inverse of [`encode_fixed_point`] up to rounding.
pub fn decode_fixed_point(value: &BigInt, prec: usize) -> f64 {
    value.to_f64().unwrap_or(f64::NAN) / 2f64.powi(prec as i32)
}

impl Mpc {
    pub fn encrypt(&self, message: &BigUint) -> Ciphertext {
        self.pk.encrypt(message)
    }

    /// Sum of one encrypted contribution below `bound` per party.
    pub fn e_random(&self, bound: &BigUint) -> Ciphertext {
        let pk = &self.pk;
        self.parties
            .par_iter()
            .map(|party| {
                party.simulate_latency();
                pk.encrypt(&party.sample_below(bound))
            })
            .reduce_with(|a, b| pk.e_add(&a, &b))
            .unwrap_or_else(|| pk.encrypt(&BigUint::from(0u32)))
    }

    /// Joint mask for [`Mpc::e_mult`]: every party picks r_i < n and publishes
    /// Enc(r_i) and Enc(r_i · a). Returns (Enc(R), Enc(R · a)) for R = Σ r_i.
    pub fn e_random_mult_share(&self, a: &Ciphertext) -> (Ciphertext, Ciphertext) {
        let pk = &self.pk;
        self.parties
            .par_iter()
            .map(|party| {
                party.simulate_latency();
                let r = party.sample_below(&pk.n);
                (pk.encrypt(&r), pk.ec_mult(a, &r))
            })
            .reduce_with(|(r, ra), (ri, rai)| (pk.e_add(&r, &ri), pk.e_add(&ra, &rai)))
            .unwrap_or_else(|| {
                let zero = pk.encrypt(&BigUint::from(0u32));
                (zero.clone(), zero)
            })
    }

    /// Enc(a · b). One joint mask and one threshold decryption of b + R.
    #[instrument(level = "trace", skip_all)]
    pub fn e_mult(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let (mask, masked_a) = self.e_random_mult_share(a);
        let blinded = self.pk.e_add(b, &mask);
        let opened = self.reveal_int(&blinded)?;
        let product = self.pk.e_sub(&self.pk.ec_mult(a, &opened), &masked_a)?;
        self.transcript().record(
            ProtocolKind::EMult,
            vec![a.0.clone(), b.0.clone(), mask.0, masked_a.0],
            vec![opened, product.0.clone()],
        );
        Ok(product)
    }

    /// Probabilistic truncation of the low `m` bits of a signed `k`-bit
    /// plaintext. The result is off by at most one.
    #[instrument(level = "trace", skip(self, a))]
    pub fn e_trunc_pr(&self, a: &Ciphertext, k: usize, m: usize) -> Result<Ciphertext> {
        if m == 0 {
            return Ok(a.clone());
        }
        if m >= k {
            return Err(MpcError::InvalidParameters(format!(
                "cannot truncate {} bits of a {}-bit value",
                m, k
            )));
        }
        let pk = &self.pk;
        let two_m = Util::pow2(m);
        let inverse = Util::mod_inverse(&two_m, &pk.n).ok_or(MpcError::NotInvertible)?;

        // each party adds at most 2^m / N so the low mask stays below 2^m
        let low_bound = std::cmp::max(&two_m / BigUint::from(self.num_parties()), BigUint::one());
        let low = self.e_random(&low_bound);
        let high = self.e_random(&Util::pow2(self.security_bits() + k - m));

        let shifted = pk.e_add(a, &pk.encrypt(&Util::pow2(k - 1)));
        let mask = pk.e_add(&pk.ec_mult(&high, &two_m), &low);
        let opened = self.reveal_int(&pk.e_add(&shifted, &mask))? % &two_m;

        // (a − (c − r)) · 2^{−m}
        let low_part = pk.e_sub(&pk.encrypt(&opened), &low)?;
        let result = pk.ec_mult(&pk.e_sub(a, &low_part)?, &inverse);
        self.transcript().record(
            ProtocolKind::ETruncPR,
            vec![a.0.clone(), low.0, high.0],
            vec![opened, result.0.clone()],
        );
        Ok(result)
    }

    /// Fixed-point product: [`Mpc::e_mult`] followed by truncation by F.
    pub fn e_fp_mult(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let product = self.e_mult(a, b)?;
        self.e_trunc_pr(&product, self.message_bits(), self.fp_precision_bits())
    }

    /// Multiplies by a public fixed-point constant and rescales by F.
    pub fn ec_mult_fp(&self, ct: &Ciphertext, x: f64) -> Result<Ciphertext> {
        let encoded = encode_fixed_point(x, self.fp_precision_bits())?;
        let scaled = self.pk.ec_mult(ct, &Util::reduce(&encoded, &self.pk.n));
        self.e_trunc_pr(&scaled, self.message_bits(), self.fp_precision_bits())
    }

    /// Joint threshold decryption. Every party produces a partial decryption
    /// and the first T are combined.
    pub fn reveal_int(&self, ct: &Ciphertext) -> Result<BigUint> {
        let partials: Vec<PartialDecryption> = self
            .parties
            .par_iter()
            .map(|party| party.partial_decrypt(ct))
            .collect();
        let plaintext = self.decryption().combine(&self.pk, &partials)?;
        self.transcript().record(
            ProtocolKind::Decrypt,
            vec![ct.0.clone()],
            vec![plaintext.clone()],
        );
        Ok(plaintext)
    }

    /// Decrypts and reads the plaintext as a signed integer in (−n/2, n/2].
    pub fn reveal_signed_int(&self, ct: &Ciphertext) -> Result<BigInt> {
        Ok(Util::to_signed(&self.reveal_int(ct)?, &self.pk.n))
    }

    /// Decrypts a signed fixed-point value with `scale` fractional bits.
    pub fn reveal_fp(&self, ct: &Ciphertext, scale: usize) -> Result<f64> {
        Ok(decode_fixed_point(&self.reveal_signed_int(ct)?, scale))
    }
}
