// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Threshold Paillier encryption.
//!
//! Keys follow the Damgård-Jurik threshold variant: n = pq with safe primes
//! p = 2p' + 1 and q = 2q' + 1, m = p'q', and the decryption exponent
//! d ≡ 0 (mod m), d ≡ 1 (mod n) is Shamir shared over Z_{nm}. A party
//! holding s_i publishes c^{2Δs_i} with Δ = N!, and any T partial
//! decryptions recombine in the exponent with integer Lagrange weights.

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::identities::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MpcError, Result};
use crate::polynomial::Polynomial;
use crate::util::Util;

/// A Paillier ciphertext, an element of Z*_{n^2}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(pub BigUint);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub n: BigUint,
    pub n_squared: BigUint,
}

impl PublicKey {
    pub fn new(n: BigUint) -> Self {
        let n_squared = &n * &n;
        PublicKey { n, n_squared }
    }

    /// Enc(m) = (1 + n)^m · r^n mod n^2 with (1 + n)^m = 1 + mn.
    pub fn encrypt(&self, message: &BigUint) -> Ciphertext {
        let mut rng = rand::thread_rng();
        let r = loop {
            let r = rng.gen_biguint_below(&self.n);
            if !r.is_zero() && r.gcd(&self.n).is_one() {
                break r;
            }
        };
        let g_m = (BigUint::one() + (message % &self.n) * &self.n) % &self.n_squared;
        Ciphertext(g_m * r.modpow(&self.n, &self.n_squared) % &self.n_squared)
    }

    /// Encrypts a signed plaintext, mapping negatives to n - |m|.
    pub fn encrypt_signed(&self, message: &BigInt) -> Ciphertext {
        self.encrypt(&Util::reduce(message, &self.n))
    }

    /// Enc(a + b)
    pub fn e_add(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        Ciphertext(&a.0 * &b.0 % &self.n_squared)
    }

    /// Enc(a - b)
    pub fn e_sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let inverse = Util::mod_inverse(&b.0, &self.n_squared).ok_or(MpcError::NotInvertible)?;
        Ok(Ciphertext(&a.0 * inverse % &self.n_squared))
    }

    /// Enc(a · k)
    pub fn ec_mult(&self, a: &Ciphertext, k: &BigUint) -> Ciphertext {
        Ciphertext(a.0.modpow(&(k % &self.n), &self.n_squared))
    }

    /// L(u) = (u - 1) / n
    fn l_function(&self, u: &BigUint) -> BigUint {
        (u - BigUint::one()) / &self.n
    }
}

/// One party's slice of the decryption exponent.
#[derive(Debug, Clone)]
pub struct ThresholdKeyShare {
    /// Evaluation point, `party + 1`.
    pub index: usize,
    pub share: BigUint,
    pub delta: BigUint,
}

/// c^{2Δs_i} mod n^2 together with the evaluation point that produced it.
#[derive(Debug, Clone)]
pub struct PartialDecryption {
    pub index: usize,
    pub value: BigUint,
}

impl ThresholdKeyShare {
    pub fn partial_decrypt(&self, pk: &PublicKey, ct: &Ciphertext) -> PartialDecryption {
        let exponent = BigUint::from(2u32) * &self.delta * &self.share;
        PartialDecryption {
            index: self.index,
            value: ct.0.modpow(&exponent, &pk.n_squared),
        }
    }
}

/// Public material needed to recombine partial decryptions.
#[derive(Debug, Clone)]
pub struct ThresholdContext {
    pub threshold: usize,
    pub num_parties: usize,
    pub delta: BigUint,
    /// (4Δ^2)^{-1} mod n
    pub combine_factor: BigUint,
}

fn factorial(n: usize) -> BigUint {
    (1..=n).fold(BigUint::one(), |acc, i| acc * BigUint::from(i))
}

/// Generates a threshold key over two safe primes of `key_bits` bits each.
#[instrument(level = "debug")]
pub fn keygen(
    key_bits: usize,
    num_parties: usize,
    threshold: usize,
) -> Result<(PublicKey, ThresholdContext, Vec<ThresholdKeyShare>)> {
    if threshold == 0 || threshold > num_parties {
        return Err(MpcError::InvalidParameters(format!(
            "threshold {} out of range for {} parties",
            threshold, num_parties
        )));
    }

    // n must have the full 2 · key_bits bits, the plaintext budget assumes it
    let (p, q, n) = loop {
        let p = Util::safe_prime_with_bits(key_bits);
        let q = Util::safe_prime_with_bits(key_bits);
        let n = &p * &q;
        if p != q && n.bits() >= 2 * key_bits {
            break (p, q, n);
        }
    };
    let p_prime: BigUint = (&p - BigUint::one()) >> 1;
    let q_prime: BigUint = (&q - BigUint::one()) >> 1;
    let m = &p_prime * &q_prime;
    let nm = &n * &m;
    debug!(n_bits = n.bits(), "generated paillier modulus");

    // d ≡ 0 mod m and d ≡ 1 mod n
    let m_inverse = Util::mod_inverse(&m, &n).ok_or(MpcError::NotInvertible)?;
    let d = &m * m_inverse;

    let delta = factorial(num_parties);
    let polynomial = Polynomial::random_with_secret(&d, threshold - 1, &nm);
    let shares = polynomial
        .evaluate_at_parties(num_parties)
        .into_iter()
        .enumerate()
        .map(|(i, share)| ThresholdKeyShare {
            index: i + 1,
            share,
            delta: delta.clone(),
        })
        .collect();

    let four_delta_squared = BigUint::from(4u32) * &delta * &delta % &n;
    let combine_factor =
        Util::mod_inverse(&four_delta_squared, &n).ok_or(MpcError::NotInvertible)?;

    let pk = PublicKey::new(n);
    let context = ThresholdContext {
        threshold,
        num_parties,
        delta,
        combine_factor,
    };
    Ok((pk, context, shares))
}

impl ThresholdContext {
    /// Integer Lagrange weight Δ·Π_{j≠i} j/(j−i) over the given points. The
    /// division is exact since Δ = N! absorbs every denominator.
    fn integer_lagrange(&self, index: usize, points: &[usize]) -> BigInt {
        let mut numerator = BigInt::from_biguint(Sign::Plus, self.delta.clone());
        let mut denominator = BigInt::one();
        for &j in points {
            if j == index {
                continue;
            }
            numerator *= BigInt::from(j as i64);
            denominator *= BigInt::from(j as i64 - index as i64);
        }
        numerator / denominator
    }

    /// Recombines the first `threshold` partial decryptions into the plaintext.
    pub fn combine(&self, pk: &PublicKey, partials: &[PartialDecryption]) -> Result<BigUint> {
        if partials.len() < self.threshold {
            return Err(MpcError::InvalidParameters(format!(
                "{} partial decryptions given, {} required",
                partials.len(),
                self.threshold
            )));
        }
        let used = &partials[..self.threshold];
        let points: Vec<usize> = used.iter().map(|pd| pd.index).collect();

        let mut product = BigUint::one();
        for pd in used {
            let (sign, magnitude) = self.integer_lagrange(pd.index, &points).to_bytes_be();
            let exponent = BigUint::from(2u32) * BigUint::from_bytes_be(&magnitude);
            let mut term = pd.value.modpow(&exponent, &pk.n_squared);
            if sign == Sign::Minus {
                term = Util::mod_inverse(&term, &pk.n_squared).ok_or(MpcError::NotInvertible)?;
            }
            product = product * term % &pk.n_squared;
        }

        Ok(pk.l_function(&product) * &self.combine_factor % &pk.n)
    }
}
