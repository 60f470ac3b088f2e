// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::{BigUint, RandBigInt};
use num_traits::identities::Zero;
use std::vec::Vec;

/// Secret sharing polynomial over Z_modulus, (t,n) threshold scheme
/// P(x) = a_0*x^0 + a_1*x^1 + a_2*x^2 + ... + a_(t-1)*x^(t-1)
/// degree is t - 1
/// s = P(0) = a_0
/// s_i = P(i)
pub struct Polynomial {
    pub coefficients: Vec<BigUint>,
    pub modulus: BigUint,
}

impl Polynomial {
    /// Samples a polynomial of the given degree whose constant term is `secret`
    /// and whose other coefficients are uniform below `modulus`.
    pub fn random_with_secret(secret: &BigUint, degree: usize, modulus: &BigUint) -> Self {
        let mut rng = rand::thread_rng();
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(secret % modulus);
        // [1,degree] not [1,degree)
        for _ in 1..=degree {
            coefficients.push(rng.gen_biguint_below(modulus));
        }

        Polynomial {
            coefficients,
            modulus: modulus.clone(),
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Get P(x) mod modulus with Horner's rule.
    pub fn evaluate(&self, x: &BigUint) -> BigUint {
        let mut acc = BigUint::zero();
        for coefficient in self.coefficients.iter().rev() {
            acc = (acc * x + coefficient) % &self.modulus;
        }
        acc
    }

    /// Evaluations at the points 1..=count, one per party.
    pub fn evaluate_at_parties(&self, count: usize) -> Vec<BigUint> {
        (1..=count)
            .map(|point| self.evaluate(&BigUint::from(point)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_polynomial() {
        let modulus = BigUint::from(101u32);
        let secret = BigUint::from(42u32);
        let polynomial = Polynomial::random_with_secret(&secret, 3, &modulus);

        assert_eq!(polynomial.coefficients.len(), 4);
        assert_eq!(polynomial.degree(), 3);
        assert_eq!(polynomial.evaluate(&BigUint::zero()), secret);
    }

    #[test]
    fn test_evaluate() {
        // 3 + 2x + x^2 over Z_11
        let polynomial = Polynomial {
            coefficients: vec![
                BigUint::from(3u32),
                BigUint::from(2u32),
                BigUint::from(1u32),
            ],
            modulus: BigUint::from(11u32),
        };
        let values = polynomial.evaluate_at_parties(3);
        assert_eq!(
            values,
            vec![
                BigUint::from(6u32),
                BigUint::from(0u32),
                BigUint::from(7u32)
            ]
        );
    }
}
