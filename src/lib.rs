// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Semi-honest multiparty computation over two representations: Shamir
//! shares over a prime field and threshold Paillier ciphertexts, with a
//! bridge between them, bit-level circuits and fixed-point division.

pub mod bits;
pub mod bridge;
pub mod error;
pub mod field;
pub mod fixed_point;
pub mod homomorphic;
pub mod interpolation;
pub mod mpc;
pub mod paillier;
pub mod params;
pub mod party;
pub mod polynomial;
pub mod share;
pub mod transcript;
pub mod util;

pub use error::{MpcError, Result};
pub use homomorphic::{decode_fixed_point, encode_fixed_point};
pub use interpolation::BooleanFunction;
pub use mpc::Mpc;
pub use paillier::{Ciphertext, PublicKey};
pub use params::MpcParams;
pub use share::Share;
pub use transcript::{ProtocolKind, Transcript, TranscriptEntry};
