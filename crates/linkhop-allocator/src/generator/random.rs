use crate::error::AllocationError;
use crate::generator::Generator;
use linkhop_core::ShortCode;
use rand::Rng;
use std::ops::RangeInclusive;

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates uniformly random base62 codes of a fixed length.
///
/// At the default length of 7 there are 62^7 (about 3.5 * 10^12) codes, so
/// collisions stay rare until the keyspace is heavily used.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub const DEFAULT_LENGTH: usize = 7;
    pub const LENGTH_RANGE: RangeInclusive<usize> = 4..=16;

    pub fn new() -> Self {
        Self {
            length: Self::DEFAULT_LENGTH,
        }
    }

    /// Creates a generator producing codes of `length` characters.
    pub fn with_length(length: usize) -> Result<Self, AllocationError> {
        if !Self::LENGTH_RANGE.contains(&length) {
            return Err(AllocationError::InvalidLength(length));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        // Base62 strings in range are always valid codes, except for the
        // handful of reserved words.
        loop {
            if let Ok(code) = ShortCode::new(self.candidate()) {
                return code;
            }
        }
    }
}
