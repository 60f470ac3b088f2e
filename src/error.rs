// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Errors raised by the MPC engine.

use thiserror::Error;

/// Everything that can abort an MPC computation.
#[derive(Debug, Error)]
pub enum MpcError {
    /// Setup parameters are inconsistent or the moduli are too small.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    /// A party was asked for a share it never received. This means the
    /// parties fell out of sync and the computation cannot continue.
    #[error("party {party} holds no share with id {id}")]
    ShareNotFound { party: usize, id: usize },
    /// A jointly sampled value kept coming out zero (or otherwise unusable).
    /// Each attempt fails with probability about 1/P.
    #[error("{protocol} sampled a degenerate value {attempts} times in a row")]
    DegenerateSample {
        protocol: &'static str,
        attempts: usize,
    },
    /// A modular inverse does not exist.
    #[error("value is not invertible modulo the given modulus")]
    NotInvertible,
    /// A vector operation received no elements.
    #[error("{0} needs at least one input")]
    EmptyInput(&'static str),
}

pub type Result<T> = std::result::Result<T, MpcError>;
