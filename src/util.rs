// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_primes::Generator;
use num_traits::identities::{One, Zero};

pub struct Util {}

impl Util {
    /// Finds the greatest common denominator of two integers *a* and *b*, and two
    /// integers *x* and *y* such that *ax* + *by* is the greatest common
    /// denominator of *a* and *b* (Bézout coefficients).
    ///
    /// This function is an implementation of the [extended Euclidean
    /// algorithm](https://en.wikipedia.org/wiki/Extended_Euclidean_algorithm).
    pub fn extend_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_x, mut x) = (BigInt::one(), BigInt::zero());
        let (mut old_y, mut y) = (BigInt::zero(), BigInt::one());
        while !r.is_zero() {
            let q = &old_r / &r;
            let next_r = &old_r - &q * &r;
            old_r = std::mem::replace(&mut r, next_r);
            let next_x = &old_x - &q * &x;
            old_x = std::mem::replace(&mut x, next_x);
            let next_y = &old_y - &q * &y;
            old_y = std::mem::replace(&mut y, next_y);
        }
        (old_r, old_x, old_y)
    }

    /// Calculates the [modular multiplicative
    /// inverse](https://en.wikipedia.org/wiki/Modular_multiplicative_inverse) *x*
    /// of an integer *a* such that *ax* ≡ 1 (mod *m*).
    ///
    /// Such an integer may not exist. If so, this function will return `None`.
    pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
        let m = BigInt::from(modulus.clone());
        let (g, x, _) = Util::extend_gcd(&BigInt::from(a.clone()), &m);
        if g != BigInt::one() {
            None
        } else {
            x.mod_floor(&m).to_biguint()
        }
    }

    /// Reduces a signed integer into `[0, modulus)`.
    pub fn reduce(a: &BigInt, modulus: &BigUint) -> BigUint {
        let m = BigInt::from(modulus.clone());
        match a.mod_floor(&m).to_biguint() {
            Some(v) => v,
            None => BigUint::zero(),
        }
    }

    /// Maps a residue to its signed representative in `(-modulus/2, modulus/2]`.
    pub fn to_signed(a: &BigUint, modulus: &BigUint) -> BigInt {
        let half = modulus >> 1;
        if a > &half {
            BigInt::from_biguint(Sign::Minus, modulus - a)
        } else {
            BigInt::from(a.clone())
        }
    }

    /// Square root modulo an odd prime (Tonelli-Shanks). Returns `None` when
    /// `a` is not a quadratic residue.
    pub fn mod_sqrt(a: &BigUint, p: &BigUint) -> Option<BigUint> {
        let one = BigUint::one();
        let a = a % p;
        if a.is_zero() {
            return Some(a);
        }
        let p_minus_1 = p - &one;
        let euler = &p_minus_1 >> 1;
        if a.modpow(&euler, p) != one {
            return None;
        }
        if (p % BigUint::from(4u32)) == BigUint::from(3u32) {
            let exp = (p + &one) >> 2;
            return Some(a.modpow(&exp, p));
        }

        // p - 1 = q * 2^s with q odd
        let mut q = p_minus_1.clone();
        let mut s = 0usize;
        while q.is_even() {
            q >>= 1;
            s += 1;
        }
        let mut z = BigUint::from(2u32);
        while z.modpow(&euler, p) != p_minus_1 {
            z += &one;
        }

        let mut m = s;
        let mut c = z.modpow(&q, p);
        let mut t = a.modpow(&q, p);
        let mut r = a.modpow(&((&q + &one) >> 1), p);
        while t != one {
            let mut i = 0usize;
            let mut t2 = t.clone();
            while t2 != one {
                t2 = &t2 * &t2 % p;
                i += 1;
            }
            let b = c.modpow(&(BigUint::one() << (m - i - 1)), p);
            m = i;
            c = &b * &b % p;
            t = t * &c % p;
            r = r * &b % p;
        }
        Some(r)
    }

    /// A prime of at least `bits` bits. `Generator::new_prime` does not pin
    /// the top bit, so shorter draws are thrown away.
    pub fn prime_with_bits(bits: usize) -> BigUint {
        loop {
            let p = Generator::new_prime(bits);
            if p.bits() >= bits {
                return p;
            }
        }
    }

    /// A safe prime p = 2p' + 1 of at least `bits` bits.
    pub fn safe_prime_with_bits(bits: usize) -> BigUint {
        loop {
            let p = Generator::safe_prime(bits);
            if p.bits() >= bits {
                return p;
            }
        }
    }

    /// 2^exp
    pub fn pow2(exp: usize) -> BigUint {
        BigUint::one() << exp
    }

    /// ⌊log2(n)⌋ for n ≥ 1, 0 otherwise.
    pub fn floor_log2(n: usize) -> usize {
        if n <= 1 {
            0
        } else {
            (usize::BITS - 1 - n.leading_zeros()) as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_gcd() {
        let a = BigInt::from(26);
        let b = BigInt::from(3);
        let (g, x, y) = Util::extend_gcd(&a, &b);

        assert_eq!(g, BigInt::one());
        assert_eq!((&a * &x) + (&b * &y), g);
    }

    #[test]
    fn test_mod_inverse() {
        // 3*inverse = 1 mod 26
        let does_exist = Util::mod_inverse(&BigUint::from(3u32), &BigUint::from(26u32));
        // 4*inverse = 1 mod 32
        let does_not_exist = Util::mod_inverse(&BigUint::from(4u32), &BigUint::from(32u32));

        assert_eq!(does_exist, Some(BigUint::from(9u32)));
        assert_eq!(does_not_exist, None);
    }

    #[test]
    fn test_mod_sqrt() {
        // 13 ≡ 1 (mod 4) goes through Tonelli-Shanks, 23 ≡ 3 (mod 4) takes the shortcut
        for p in [13u32, 23, 41, 97] {
            let p = BigUint::from(p);
            for x in 1u32..20 {
                let x = BigUint::from(x);
                let square = &x * &x % &p;
                if square.is_zero() {
                    continue;
                }
                let root = Util::mod_sqrt(&square, &p).unwrap();
                assert_eq!(&root * &root % &p, square);
            }
        }
        // 5 is a non residue mod 13
        assert_eq!(Util::mod_sqrt(&BigUint::from(5u32), &BigUint::from(13u32)), None);
    }

    #[test]
    fn test_signed_representatives() {
        let p = BigUint::from(97u32);
        let minus_three = Util::reduce(&BigInt::from(-3), &p);
        assert_eq!(minus_three, BigUint::from(94u32));
        assert_eq!(Util::to_signed(&minus_three, &p), BigInt::from(-3));
        assert_eq!(Util::to_signed(&BigUint::from(5u32), &p), BigInt::from(5));
    }

    #[test]
    fn test_primes_have_full_length() {
        for _ in 0..50 {
            let p = Util::prime_with_bits(73);
            assert!(p.bits() >= 73, "{} has {} bits", p, p.bits());
            assert!(num_primes::Verification::is_prime(&p));
        }
        for _ in 0..10 {
            let p = Util::safe_prime_with_bits(32);
            assert!(p.bits() >= 32);
            let half = (&p - BigUint::one()) >> 1;
            assert!(num_primes::Verification::is_prime(&half));
        }
    }

    #[test]
    fn test_floor_log2() {
        assert_eq!(Util::floor_log2(1), 0);
        assert_eq!(Util::floor_log2(3), 1);
        assert_eq!(Util::floor_log2(4), 2);
        assert_eq!(Util::floor_log2(17), 4);
    }
}
