//! Injected entropy for nonce generation
//!
//! Nonces must be unpredictable, so production code uses
//! [`SystemRandomSource`]. The deterministic sources exist for tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ring::rand::{SecureRandom, SystemRandom};

/// A source of random bytes
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Fill `dest` with random bytes and return how many were written
    ///
    /// Returning fewer than `dest.len()` signals exhaustion or failure.
    fn fill(&self, dest: &mut [u8]) -> usize;
}

/// Operating system CSPRNG via `ring`
#[derive(Debug)]
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    /// Create a handle to the system random number generator
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> usize {
        match self.rng.fill(dest) {
            Ok(()) => dest.len(),
            Err(_) => {
                tracing::error!("System random number generator failed");
                0
            }
        }
    }
}

/// Deterministic source: every call yields a distinct, reproducible block
///
/// Call `n` fills the buffer with `seed + n` in big-endian order, repeated.
/// Not random in any sense; for tests only.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    seed: u64,
    calls: AtomicU64,
}

impl SequenceRandom {
    /// Create a source starting at `seed`
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            calls: AtomicU64::new(0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn fill(&self, dest: &mut [u8]) -> usize {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let block = self.seed.wrapping_add(call).to_be_bytes();
        for (byte, value) in dest.iter_mut().zip(block.iter().cycle()) {
            *byte = *value;
        }
        dest.len()
    }
}

/// Source that never produces more than `limit` bytes
#[derive(Debug, Clone, Copy)]
pub struct ShortRandom {
    limit: usize,
}

impl ShortRandom {
    /// Create a source capped at `limit` bytes per call
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl RandomSource for ShortRandom {
    fn fill(&self, dest: &mut [u8]) -> usize {
        let written = self.limit.min(dest.len());
        dest[..written].fill(0xA5);
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_source_fills_buffer() {
        let source = SystemRandomSource::new();
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];

        assert_eq!(source.fill(&mut first), 32);
        assert_eq!(source.fill(&mut second), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_sequence_source_is_distinct_per_call() {
        let source = SequenceRandom::new(7);
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];

        source.fill(&mut first);
        source.fill(&mut second);

        assert_eq!(&first[..8], &7u64.to_be_bytes());
        assert_eq!(&second[..8], &8u64.to_be_bytes());
        assert_ne!(first, second);
    }

    #[test]
    fn test_short_source_reports_shortfall() {
        let source = ShortRandom::new(5);
        let mut buf = [0u8; 32];
        assert_eq!(source.fill(&mut buf), 5);

        let mut small = [0u8; 3];
        assert_eq!(source.fill(&mut small), 3);
    }
}
