// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Log of interactive homomorphic protocol runs.
//!
//! Each entry records the ciphertexts a protocol consumed and the values it
//! produced, so a verifier holding the same public inputs can recompute the
//! inputs of every round. Entries are chained with SHA-256:
//! `h_0 = 0^32`, `h_i = SHA256(h_{i-1} || entry_i)`.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolKind {
    EMult,
    ETruncPR,
    PaillierToShare,
    ShareToPaillier,
    Decrypt,
}

impl ProtocolKind {
    fn tag(self) -> u8 {
        match self {
            ProtocolKind::EMult => 0,
            ProtocolKind::ETruncPR => 1,
            ProtocolKind::PaillierToShare => 2,
            ProtocolKind::ShareToPaillier => 3,
            ProtocolKind::Decrypt => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub kind: ProtocolKind,
    pub inputs: Vec<BigUint>,
    pub outputs: Vec<BigUint>,
}

impl TranscriptEntry {
    fn absorb(&self, hasher: &mut Sha256) {
        hasher.update([self.kind.tag()]);
        for values in [&self.inputs, &self.outputs] {
            hasher.update((values.len() as u64).to_be_bytes());
            for value in values.iter() {
                let bytes = value.to_bytes_be();
                hasher.update((bytes.len() as u64).to_be_bytes());
                hasher.update(&bytes);
            }
        }
    }
}

fn chain(previous: &[u8; 32], entry: &TranscriptEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(previous);
    entry.absorb(&mut hasher);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

#[derive(Debug, Default)]
struct Log {
    entries: Vec<TranscriptEntry>,
    head: [u8; 32],
}

/// Append-only protocol log. Recording can be switched off, in which case
/// [`Transcript::record`] is a no-op.
#[derive(Debug, Default)]
pub struct Transcript {
    enabled: bool,
    log: Mutex<Log>,
}

impl Transcript {
    pub fn new(enabled: bool) -> Self {
        Transcript {
            enabled,
            log: Mutex::default(),
        }
    }

    fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&self, kind: ProtocolKind, inputs: Vec<BigUint>, outputs: Vec<BigUint>) {
        if !self.enabled {
            return;
        }
        let entry = TranscriptEntry {
            kind,
            inputs,
            outputs,
        };
        let mut log = self.log();
        log.head = chain(&log.head, &entry);
        log.entries.push(entry);
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.log().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.log().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Digest over every entry recorded so far.
    pub fn digest(&self) -> [u8; 32] {
        self.log().head
    }

    /// Hands the log to the caller and starts a fresh chain.
    pub fn take(&self) -> (Vec<TranscriptEntry>, [u8; 32]) {
        let log = std::mem::take(&mut *self.log());
        (log.entries, log.head)
    }

    /// Recomputes the chain over `entries` and compares it with `digest`.
    pub fn verify_chain(entries: &[TranscriptEntry], digest: &[u8; 32]) -> bool {
        let head = entries
            .iter()
            .fold([0u8; 32], |head, entry| chain(&head, entry));
        &head == digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: u32) -> (ProtocolKind, Vec<BigUint>, Vec<BigUint>) {
        (
            ProtocolKind::Decrypt,
            vec![BigUint::from(value)],
            vec![BigUint::from(value + 1)],
        )
    }

    #[test]
    fn test_disabled_records_nothing() {
        let transcript = Transcript::new(false);
        let (kind, inputs, outputs) = sample(1);
        transcript.record(kind, inputs, outputs);
        assert!(transcript.is_empty());
        assert_eq!(transcript.digest(), [0u8; 32]);
    }

    #[test]
    fn test_chain_detects_edits() {
        let transcript = Transcript::new(true);
        for v in 0..4 {
            let (kind, inputs, outputs) = sample(v);
            transcript.record(kind, inputs, outputs);
        }
        let (mut entries, digest) = transcript.take();
        assert_eq!(entries.len(), 4);
        assert!(transcript.is_empty());
        assert!(Transcript::verify_chain(&entries, &digest));

        entries[2].outputs[0] = BigUint::from(99u32);
        assert!(!Transcript::verify_chain(&entries, &digest));

        entries.truncate(2);
        assert!(!Transcript::verify_chain(&entries, &digest));
    }
}
