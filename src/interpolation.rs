// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Lagrange interpolation over Z_P.
//!
//! Two uses: the reconstruction weights every party keeps for opening
//! threshold- and full-degree sharings, and the polynomials that turn a
//! symmetric boolean function of n bits into a univariate polynomial of
//! `1 + Σ bits`.

use num_bigint::{BigInt, BigUint};
use num_traits::identities::{One, Zero};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::util::Util;

/// Symmetric boolean functions that can be evaluated through interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanFunction {
    Or,
    Xor,
}

impl BooleanFunction {
    /// Truth table expressed over `x = 1 + number of set bits`.
    fn value_at(self, x: usize) -> bool {
        match self {
            BooleanFunction::Or => x > 1,
            BooleanFunction::Xor => x % 2 == 0,
        }
    }
}

/// Lagrange weight of `point` for reconstructing f(0) from the points
/// `1..=count`. `point` must lie in that range.
pub fn lagrange_weight(point: usize, count: usize, modulus: &BigUint) -> Option<BigUint> {
    let xi = BigInt::from(point as u64);
    let mut numerator = BigInt::one();
    let mut denominator = BigInt::one();
    for j in 1..=count {
        if j == point {
            continue;
        }
        let xj = BigInt::from(j as u64);
        denominator *= &xj - &xi;
        numerator *= xj;
    }
    let denominator = Util::reduce(&denominator, modulus);
    let inverse = Util::mod_inverse(&denominator, modulus)?;
    Some(Util::reduce(&numerator, modulus) * inverse % modulus)
}

/// Coefficients (constant term first) of the unique polynomial of degree at
/// most n with f(x) = value_at(x) for x in 1..=n+1.
fn interpolate(function: BooleanFunction, n: usize, modulus: &BigUint) -> Option<Vec<BigUint>> {
    let mut result = vec![BigUint::zero(); n + 1];
    for xj in 1..=n + 1 {
        if !function.value_at(xj) {
            continue;
        }

        // basis polynomial Π_{m≠j} (X - x_m) / (x_j - x_m)
        let mut basis = vec![BigUint::one()];
        let mut denominator = BigInt::one();
        for xm in 1..=n + 1 {
            if xm == xj {
                continue;
            }
            let shift = Util::reduce(&BigInt::from(-(xm as i64)), modulus);
            let mut next = vec![BigUint::zero(); basis.len() + 1];
            for (i, c) in basis.iter().enumerate() {
                next[i + 1] = (&next[i + 1] + c) % modulus;
                next[i] = (&next[i] + c * &shift) % modulus;
            }
            basis = next;
            denominator *= BigInt::from(xj as i64 - xm as i64);
        }

        let inverse = Util::mod_inverse(&Util::reduce(&denominator, modulus), modulus)?;
        for (acc, c) in result.iter_mut().zip(basis.iter()) {
            *acc = (&*acc + c * &inverse) % modulus;
        }
    }
    Some(result)
}

/// Memoized interpolation polynomials, keyed by function and input length.
///
/// Owned by the coordinator so separate engines never share entries computed
/// for a different field.
#[derive(Debug, Default)]
pub struct InterpolationCache {
    entries: Mutex<HashMap<(BooleanFunction, usize), Arc<Vec<BigUint>>>>,
}

impl InterpolationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(BooleanFunction, usize), Arc<Vec<BigUint>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn coefficients(
        &self,
        function: BooleanFunction,
        n: usize,
        modulus: &BigUint,
    ) -> Option<Arc<Vec<BigUint>>> {
        if let Some(hit) = self.entries().get(&(function, n)) {
            return Some(Arc::clone(hit));
        }
        // computed outside the lock; a racing thread computes the same table
        let table = Arc::new(interpolate(function, n, modulus)?);
        let mut entries = self.entries();
        Some(Arc::clone(entries.entry((function, n)).or_insert(table)))
    }

    /// Fills the cache for every length below `max_len`.
    pub fn precompute(&self, max_len: usize, modulus: &BigUint) {
        for n in 1..max_len {
            self.coefficients(BooleanFunction::Or, n, modulus);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(coefficients: &[BigUint], x: usize, modulus: &BigUint) -> BigUint {
        let x = BigUint::from(x);
        coefficients
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, c| (acc * &x + c) % modulus)
    }

    #[test]
    fn test_lagrange_weights_reconstruct() {
        let p = BigUint::from(1_000_003u32);
        // f(x) = 7 + 3x + 5x^2, any 3 points give back 7
        let f = |x: u64| BigUint::from(7 + 3 * x + 5 * x * x) % &p;
        let secret: BigUint = (1..=3)
            .map(|i| f(i as u64) * lagrange_weight(i, 3, &p).unwrap())
            .fold(BigUint::zero(), |acc, v| (acc + v) % &p);
        assert_eq!(secret, BigUint::from(7u32));
    }

    #[test]
    fn test_or_polynomial_truth_table() {
        let p = BigUint::from(1_000_003u32);
        for n in 1..8 {
            let poly = interpolate(BooleanFunction::Or, n, &p).unwrap();
            assert_eq!(poly.len(), n + 1);
            assert_eq!(eval(&poly, 1, &p), BigUint::zero());
            for x in 2..=n + 1 {
                assert_eq!(eval(&poly, x, &p), BigUint::one());
            }
        }
    }

    #[test]
    fn test_xor_polynomial_truth_table() {
        let p = BigUint::from(1_000_003u32);
        for n in 1..8 {
            let poly = interpolate(BooleanFunction::Xor, n, &p).unwrap();
            for x in 1..=n + 1 {
                let expected = if (x - 1) % 2 == 1 {
                    BigUint::one()
                } else {
                    BigUint::zero()
                };
                assert_eq!(eval(&poly, x, &p), expected);
            }
        }
    }

    #[test]
    fn test_cache_memoizes() {
        let p = BigUint::from(1_000_003u32);
        let cache = InterpolationCache::new();
        assert!(cache.is_empty());
        let first = cache.coefficients(BooleanFunction::Or, 5, &p).unwrap();
        let second = cache.coefficients(BooleanFunction::Or, 5, &p).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        cache.coefficients(BooleanFunction::Xor, 5, &p).unwrap();
        assert_eq!(cache.len(), 2);
    }
}
