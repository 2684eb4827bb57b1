//! Deterministic single-bit source backed by a simulated qubit.
//!
//! The simulator runs a fixed one-qubit circuit (initialize, reset,
//! initialize, measure) and takes a single shot. The shot's randomness comes
//! from a generator seeded with the password seed, so the same seed always
//! measures the same bit.

use crate::error::{CryptoError, CryptoResult};
use crate::key::Seed;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::f64::consts::FRAC_1_SQRT_2;

/// Domain separator for the shot generator seed.
const SHOT_DOMAIN: &[u8] = b"qvault-qubit-shot-v1";

/// Tolerance when checking that a prepared state is normalized.
const NORM_EPSILON: f64 = 1e-9;

/// Capability to measure one pseudo-random bit from a seed.
///
/// Implementations must be deterministic in `seed` and consult no external
/// entropy. The returned value is `0` or `1`.
pub trait BitSource {
    fn measure_one_bit(&self, seed: &Seed) -> CryptoResult<u8>;
}

/// Real amplitudes of a single-qubit state `alpha|0> + beta|1>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QubitState {
    alpha: f64,
    beta: f64,
}

impl QubitState {
    pub const fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// `|0>`, the state a reset leaves behind.
    pub const fn ground() -> Self {
        Self::new(1.0, 0.0)
    }

    /// `|1>`. Always measures 1.
    pub const fn excited() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Equal superposition of `|0>` and `|1>`.
    pub const fn superposition() -> Self {
        Self::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Probability that a measurement yields `0`.
    pub fn probability_of_zero(&self) -> f64 {
        self.alpha * self.alpha
    }

    /// Probability that a measurement yields `1`.
    pub fn probability_of_one(&self) -> f64 {
        self.beta * self.beta
    }

    fn validate(&self) -> CryptoResult<()> {
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(CryptoError::SourceUnavailable(
                "qubit amplitudes must be finite".into(),
            ));
        }
        let norm = self.alpha * self.alpha + self.beta * self.beta;
        if (norm - 1.0).abs() > NORM_EPSILON {
            return Err(CryptoError::SourceUnavailable(format!(
                "qubit state is not normalized (|a|^2 + |b|^2 = {norm})"
            )));
        }
        Ok(())
    }
}

impl Default for QubitState {
    fn default() -> Self {
        Self::superposition()
    }
}

#[derive(Clone, Copy, Debug)]
enum Instruction {
    Initialize(QubitState),
    Reset,
}

/// Single-qubit, single-shot measurement simulator.
#[derive(Clone, Debug, Default)]
pub struct QubitSimulator {
    prepared: QubitState,
}

impl QubitSimulator {
    pub fn new(prepared: QubitState) -> Self {
        Self { prepared }
    }

    pub fn prepared_state(&self) -> QubitState {
        self.prepared
    }

    fn circuit(&self) -> [Instruction; 3] {
        [
            Instruction::Initialize(self.prepared),
            Instruction::Reset,
            Instruction::Initialize(self.prepared),
        ]
    }

    /// Runs the circuit up to (not including) the measurement.
    fn evolve(&self) -> CryptoResult<QubitState> {
        let mut qubit = QubitState::ground();
        for instruction in self.circuit() {
            qubit = match instruction {
                Instruction::Initialize(state) => {
                    state.validate()?;
                    state
                }
                Instruction::Reset => QubitState::ground(),
            };
        }
        Ok(qubit)
    }
}

impl BitSource for QubitSimulator {
    fn measure_one_bit(&self, seed: &Seed) -> CryptoResult<u8> {
        let qubit = self.evolve()?;

        let digest = Sha256::new()
            .chain_update(SHOT_DOMAIN)
            .chain_update(seed.as_be_bytes())
            .finalize();
        let mut shot = StdRng::from_seed(digest.into());
        let sample: f64 = shot.random();

        // |0> owns [0, alpha^2) of the unit interval, |1> the rest.
        Ok(u8::from(sample >= qubit.probability_of_zero()))
    }
}
