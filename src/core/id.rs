//! Identifier Generator
//!
//! Random alphanumeric token identifiers.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifier generator interface (for dependency injection).
pub trait IdGenerator: Send + Sync {
    /// Generate an identifier of exactly `length` characters.
    fn generate(&self, length: usize) -> String;
}

/// CSPRNG-backed generator over `[A-Za-z0-9]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    /// Create new random identifier generator.
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, length: usize) -> String {
        // thread_rng is a ChaCha-based CSPRNG reseeded from the OS.
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

/// Mock identifier generator for testing.
///
/// Hands out queued identifiers first, then zero-padded sequence numbers.
#[derive(Default)]
pub struct MockIdGenerator {
    queued: Mutex<VecDeque<String>>,
    generate_history: Mutex<Vec<usize>>,
    sequence: AtomicU64,
}

impl MockIdGenerator {
    /// Create new mock identifier generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next identifier to generate.
    pub fn push_next_id(&self, id: impl Into<String>) -> &Self {
        self.queued.lock().unwrap().push_back(id.into());
        self
    }

    /// Get requested lengths, one per call.
    pub fn get_generate_history(&self) -> Vec<usize> {
        self.generate_history.lock().unwrap().clone()
    }
}

impl IdGenerator for MockIdGenerator {
    fn generate(&self, length: usize) -> String {
        self.generate_history.lock().unwrap().push(length);

        if let Some(id) = self.queued.lock().unwrap().pop_front() {
            return id;
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:0>width$}", n, width = length)
    }
}

/// Create random identifier generator.
pub fn create_id_generator() -> RandomIdGenerator {
    RandomIdGenerator::new()
}

/// Create mock identifier generator for testing.
pub fn create_mock_id_generator() -> MockIdGenerator {
    MockIdGenerator::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_id_shape() {
        let generator = RandomIdGenerator::new();
        let id = generator.generate(20);

        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_ids_do_not_repeat() {
        let generator = RandomIdGenerator::new();
        let ids: HashSet<String> = (0..1_000).map(|_| generator.generate(20)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_mock_generator() {
        let generator = MockIdGenerator::new();
        generator.push_next_id("queuedqueuedqueued01");

        assert_eq!(generator.generate(20), "queuedqueuedqueued01");
        assert_eq!(generator.generate(20), "00000000000000000001");
        assert_eq!(generator.generate(5), "00002");
        assert_eq!(generator.get_generate_history(), vec![20, 20, 5]);
    }
}
