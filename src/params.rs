// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MpcError, Result};
use crate::util::Util;

/// Setup parameters for an [`crate::Mpc`] instance.
///
/// Deserializable so an application can keep it in its own config file.
/// Missing fields fall back to [`MpcParams::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcParams {
    /// N
    pub num_parties: usize,
    /// T, number of parties needed to reveal or decrypt
    pub threshold: usize,
    /// bit length of each Paillier prime
    pub key_bits: usize,
    /// K, plaintexts stay below 2^K
    pub message_bits: usize,
    /// S, statistical security parameter
    pub security_bits: usize,
    /// F, fractional bits of fixed-point values
    pub fp_precision_bits: usize,
    /// simulated one-way delay each party pays per round
    pub network_latency: Duration,
    /// log interactive homomorphic protocols for later audit
    pub record_transcript: bool,
    /// retries before a sampling loop gives up
    pub max_sampling_attempts: usize,
}

impl Default for MpcParams {
    fn default() -> Self {
        MpcParams {
            num_parties: 3,
            threshold: 2,
            key_bits: 512,
            message_bits: 32,
            security_bits: 40,
            fp_precision_bits: 10,
            network_latency: Duration::from_millis(0),
            record_transcript: false,
            max_sampling_attempts: 64,
        }
    }
}

impl MpcParams {
    /// ⌊log2 N⌋, the headroom needed for sums of N party contributions.
    pub fn party_bits(&self) -> usize {
        Util::floor_log2(self.num_parties)
    }

    /// Bit length of the field prime P. Large enough for every masked
    /// reveal, including the double-width products of the division engine.
    pub fn field_bits(&self) -> usize {
        let needed =
            2 * self.message_bits + self.security_bits + self.party_bits() + 4;
        needed.max(self.key_bits)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(MpcError::InvalidParameters(msg));

        if self.threshold == 0 || self.threshold > self.num_parties {
            return invalid(format!(
                "threshold {} must lie in [1, {}]",
                self.threshold, self.num_parties
            ));
        }
        if 2 * self.threshold - 1 > self.num_parties {
            return invalid(format!(
                "multiplication needs 2T - 1 <= N, got T = {} and N = {}",
                self.threshold, self.num_parties
            ));
        }
        let budget = self.message_bits
            + self.security_bits
            + self.fp_precision_bits
            + self.party_bits()
            + 1;
        if budget >= 2 * self.key_bits {
            return invalid(format!(
                "paillier modulus of ~{} bits too small for {} bits of message and masks",
                2 * self.key_bits,
                budget
            ));
        }
        if 2 * self.fp_precision_bits > self.message_bits {
            return invalid(format!(
                "{} fractional bits do not fit a {}-bit message space",
                self.fp_precision_bits, self.message_bits
            ));
        }
        if self.message_bits < 2 {
            return invalid("message space needs at least 2 bits".to_string());
        }
        if self.max_sampling_attempts == 0 {
            return invalid("max_sampling_attempts must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MpcParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_small_modulus() {
        let params = MpcParams {
            key_bits: 32,
            message_bits: 32,
            security_bits: 40,
            ..MpcParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MpcError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for (n, t) in [(3, 0), (3, 4), (3, 3), (4, 3)] {
            let params = MpcParams {
                num_parties: n,
                threshold: t,
                ..MpcParams::default()
            };
            assert!(params.validate().is_err(), "n = {}, t = {}", n, t);
        }
        let params = MpcParams {
            num_parties: 5,
            threshold: 3,
            ..MpcParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_precision_overflow() {
        let params = MpcParams {
            message_bits: 16,
            fp_precision_bits: 9,
            ..MpcParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_field_bits() {
        let params = MpcParams {
            key_bits: 64,
            message_bits: 24,
            security_bits: 20,
            num_parties: 3,
            ..MpcParams::default()
        };
        // 2*24 + 20 + 1 + 4
        assert_eq!(params.field_bits(), 73);
    }
}
