// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Conversion between Paillier ciphertexts and field shares.
//!
//! Both directions open the value once, blinded by a jointly sampled r that
//! exists as a ciphertext and as a field share at the same time.

use num_bigint::BigUint;
use rayon::prelude::*;
use tracing::instrument;

use crate::error::Result;
use crate::mpc::Mpc;
use crate::paillier::Ciphertext;
use crate::share::{Share, JOINT_OWNER};
use crate::transcript::ProtocolKind;
use crate::util::Util;

impl Mpc {
    /// Every party samples r_i < `bound`, encrypts it and reshares it.
    /// Returns Enc(r) and a sharing of r for r = Σ r_i.
    pub fn e_random_and_share(&self, bound: &BigUint) -> (Ciphertext, Share) {
        let pk = &self.pk;
        let t = self.threshold;
        let n = self.num_parties();
        let (ciphertexts, contributions): (Vec<Ciphertext>, Vec<Vec<BigUint>>) = self
            .parties
            .par_iter()
            .map(|party| {
                party.simulate_latency();
                let r = party.sample_below(bound);
                (pk.encrypt(&r), party.reshare(&r, t, n))
            })
            .unzip();
        let encrypted = ciphertexts
            .iter()
            .skip(1)
            .fold(ciphertexts[0].clone(), |acc, ct| pk.e_add(&acc, ct));
        (encrypted, self.deliver(JOINT_OWNER, &contributions))
    }

    /// Field sharing of the plaintext under `ct`.
    ///
    /// The plaintext x must be non-negative with x + N · 2^S < n, otherwise
    /// the blinded opening wraps.
    #[instrument(level = "trace", skip_all)]
    pub fn paillier_to_share(&self, ct: &Ciphertext) -> Result<Share> {
        let (enc_r, r) = self.e_random_and_share(&Util::pow2(self.security_bits()));
        let blinded = self.pk.e_add(ct, &enc_r);
        let opened = self.reveal_int(&blinded)?;
        let shared = self.create_shares(&opened);
        self.transcript().record(
            ProtocolKind::PaillierToShare,
            vec![ct.0.clone(), enc_r.0, blinded.0],
            vec![opened],
        );
        self.sub(shared, r)
    }

    /// Encryption of the value behind `share`, which must be below 2^K.
    #[instrument(level = "trace", skip_all)]
    pub fn share_to_paillier(&self, share: Share) -> Result<Ciphertext> {
        let bound = Util::pow2(self.message_bits() + self.security_bits());
        let (enc_r, r) = self.e_random_and_share(&bound);
        let opened = self.reveal_share(self.add(share, r)?)?;
        let result = self.pk.e_sub(&self.pk.encrypt(&opened), &enc_r)?;
        self.transcript().record(
            ProtocolKind::ShareToPaillier,
            vec![enc_r.0],
            vec![opened, result.0.clone()],
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::transcript::ProtocolKind;
    use crate::{Mpc, MpcParams};
    use num_bigint::BigUint;
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
            record_transcript: true,
            max_sampling_attempts: 64,
        })
        .unwrap()
    }

    #[test]
    fn test_paillier_to_share() {
        let mpc = mpc();
        for value in [0u32, 1, 77, 16_777_215] {
            let ct = mpc.encrypt(&BigUint::from(value));
            let share = mpc.paillier_to_share(&ct).unwrap();
            assert_eq!(mpc.reveal_share(share).unwrap(), BigUint::from(value));
        }
    }

    #[test]
    fn test_share_to_paillier() {
        let mpc = mpc();
        let share = mpc.create_shares(&BigUint::from(424242u32));
        let ct = mpc.share_to_paillier(share).unwrap();
        assert_eq!(mpc.reveal_int(&ct).unwrap(), BigUint::from(424242u32));
    }

    #[test]
    fn test_bridge_is_logged() {
        let mpc = mpc();
        let ct = mpc.encrypt(&BigUint::from(9u32));
        let share = mpc.paillier_to_share(&ct).unwrap();
        mpc.transcript().take();
        mpc.share_to_paillier(share).unwrap();
        let kinds: Vec<ProtocolKind> = mpc.transcript().entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ProtocolKind::ShareToPaillier]);
    }
}
