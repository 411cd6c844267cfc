//! Connection id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique connection identifier.
///
/// Ids are handed out in accept order, so ordering by `ConnId` is ordering by
/// connection age.
pub type ConnId = u64;

/// Generates unique connection ids.
///
/// Counter starts at 1 so that 0 never names a live connection.
#[derive(Debug)]
pub struct ConnIdGenerator {
    counter: AtomicU64,
}

const CONN_ID_START: u64 = 1;

impl ConnIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(CONN_ID_START),
        }
    }

    /// Generate the next unique id.
    pub fn next(&self) -> ConnId {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ConnIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_id_generation() {
        let generator = ConnIdGenerator::new();
        assert_eq!(generator.next(), 1);
        assert_eq!(generator.next(), 2);
        assert_eq!(generator.next(), 3);
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let generator = Arc::new(ConnIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..250).map(|_| generator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
