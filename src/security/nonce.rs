use crate::constants::{DEFAULT_NONCE_LENGTH, NONCE_BUFFER_POOL_SIZE};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use getrandom::getrandom;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Generates random base64 nonces for `'nonce-…'` sources.
///
/// Shared across requests; each request asks for at most one nonce.
#[derive(Debug)]
pub struct NonceGenerator {
    length: usize,
    buffer_pool: Mutex<SmallVec<[Vec<u8>; NONCE_BUFFER_POOL_SIZE]>>,
    generated: AtomicUsize,
}

impl NonceGenerator {
    /// Generator producing nonces from `length` random bytes.
    #[inline]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(16),
            buffer_pool: Mutex::new(SmallVec::new()),
            generated: AtomicUsize::new(0),
        }
    }

    pub fn generate(&self) -> String {
        self.generated.fetch_add(1, Ordering::Relaxed);

        let mut buffer = self
            .buffer_pool
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.length]);
        buffer.resize(self.length, 0);

        getrandom(&mut buffer).expect("Failed to generate random bytes");
        let encoded = BASE64.encode(&buffer);

        let mut pool = self.buffer_pool.lock();
        if pool.len() < NONCE_BUFFER_POOL_SIZE {
            pool.push(buffer);
        }

        encoded
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_are_unique_and_sized() {
        let generator = NonceGenerator::default();
        let first = generator.generate();
        let second = generator.generate();

        assert_ne!(first, second);
        assert_eq!(BASE64.decode(&first).unwrap().len(), DEFAULT_NONCE_LENGTH);
        assert_eq!(generator.generated(), 2);
    }

    #[test]
    fn short_lengths_are_raised() {
        assert_eq!(NonceGenerator::new(4).length(), 16);
    }
}
