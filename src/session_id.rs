use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::store::KeyValueStore;
use crate::types::SessionId;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default length of a generated session ID.
pub const SESSION_ID_LENGTH: usize = 15;

/// Draws per length before the generator widens the ID by one character.
pub const MAX_ATTEMPTS_PER_LENGTH: u32 = 32;

/// Produces session IDs that are unique against a live store.
///
/// Seeded once from the system clock. The IDs are not secret: they are short
/// public handles, so collision avoidance is the only requirement.
pub struct SessionIdGenerator {
    rng: Mutex<StdRng>,
    length: usize,
}

impl SessionIdGenerator {
    /// Create a generator seeded from the current time.
    #[must_use]
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| u64::try_from(d.as_nanos()).ok())
            .unwrap_or_default();
        Self::with_seed(nanos)
    }

    /// Create a generator with a fixed seed (reproducible sequences).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            length: SESSION_ID_LENGTH,
        }
    }

    /// Override the starting ID length (default: 15).
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate an ID that is not a key of `store`.
    ///
    /// After [`MAX_ATTEMPTS_PER_LENGTH`] collisions the candidate length grows
    /// by one, so the loop always terminates for a finite store.
    pub fn generate<V>(&self, store: &KeyValueStore<SessionId, V>) -> SessionId
    where
        V: Clone + Debug,
    {
        self.generate_unique(|candidate| store.contains(candidate))
    }

    /// Generate an ID for which `is_taken` returns `false`.
    pub fn generate_unique(&self, mut is_taken: impl FnMut(&SessionId) -> bool) -> SessionId {
        let mut rng = self.rng.lock();
        let mut length = self.length;
        loop {
            for _ in 0..MAX_ATTEMPTS_PER_LENGTH {
                let candidate = sample(&mut rng, length);
                if !is_taken(&candidate) {
                    return candidate;
                }
            }
            tracing::warn!(length, "session id space crowded, widening");
            length += 1;
        }
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn sample(rng: &mut StdRng, length: usize) -> SessionId {
    let id: String = (0..length)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect();
    SessionId::from_generated(id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_default_length_and_charset() {
        let generator = SessionIdGenerator::new();
        let store: KeyValueStore<SessionId, String> = KeyValueStore::new();
        let id = generator.generate(&store);
        assert_eq!(id.as_str().len(), SESSION_ID_LENGTH);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let store: KeyValueStore<SessionId, ()> = KeyValueStore::new();
        let a = SessionIdGenerator::with_seed(7);
        let b = SessionIdGenerator::with_seed(7);
        assert_eq!(a.generate(&store), b.generate(&store));
    }

    #[test]
    fn test_never_returns_existing_key() {
        // Alphabet of 62 one-char IDs: with 61 taken, only one answer remains.
        for seed in 0..200 {
            let generator = SessionIdGenerator::with_seed(seed).with_length(1);
            let store = KeyValueStore::new();
            let mut taken = HashSet::new();
            while store.len() < CHARSET.len() - 1 {
                let id = generator.generate(&store);
                assert!(taken.insert(id.clone()), "duplicate {id} for seed {seed}");
                store.add(id, seed);
            }

            let last = generator.generate(&store);
            assert!(!store.contains(&last), "seed {seed} returned a live id");
            assert!(!taken.contains(&last));
        }
    }

    #[test]
    fn test_widens_when_space_exhausted() {
        let generator = SessionIdGenerator::with_seed(1).with_length(1);
        let store = KeyValueStore::new();
        for &b in CHARSET {
            store.add(SessionId::from_generated(char::from(b).to_string()), ());
        }

        let id = generator.generate(&store);
        assert_eq!(id.as_str().len(), 2);
        assert_eq!(generator.length(), 1);
    }

    #[test]
    fn test_generate_unique_respects_predicate() {
        let generator = SessionIdGenerator::with_seed(42);
        let mut calls = 0;
        let id = generator.generate_unique(|_| {
            calls += 1;
            calls < 5
        });
        assert_eq!(calls, 5);
        assert_eq!(id.as_str().len(), SESSION_ID_LENGTH);
    }
}
