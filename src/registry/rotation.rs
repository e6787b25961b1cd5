//! Round-robin key rotation
//!
//! One cursor per provider. A dispense is a single atomic read-modify-write,
//! so concurrent callers never observe a lost update.

use std::sync::atomic::{AtomicUsize, Ordering};

/// An ordered key pool with a rotation cursor.
#[derive(Debug)]
pub struct KeyRotation {
    /// Keys in configured order
    keys: Vec<String>,
    /// Index of the next key to dispense, always in `[0, keys.len())`
    cursor: AtomicUsize,
}

impl KeyRotation {
    /// Create a rotation starting at the first key.
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Dispense the key under the cursor and advance to `(cursor + 1) mod len`.
    ///
    /// Returns `None` for an empty pool; the cursor is left untouched.
    pub fn next_key(&self) -> Option<&str> {
        let len = self.keys.len();
        if len == 0 {
            return None;
        }

        // The closure always returns Some, so fetch_update cannot fail
        let previous = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
        {
            Ok(i) | Err(i) => i,
        };

        Some(&self.keys[previous])
    }

    /// Current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}
