//! Single-slot nonce storage for replay prevention
//!
//! Unlike a replay cache that remembers every spent identifier, the server
//! only ever honours the nonce of its most recent mint. Storing a new nonce
//! replaces the old one.

use std::fmt;

use parking_lot::RwLock;
use subtle::ConstantTimeEq;

/// Holder of the one currently valid nonce
///
/// Implementations must be safe to share between request handlers. A
/// distributed deployment can back this with an external store.
pub trait NonceStore: Send + Sync + fmt::Debug {
    /// Replace the current nonce
    fn set(&self, nonce: String);

    /// The current nonce, if any mint has succeeded
    fn current(&self) -> Option<String>;

    /// Check `candidate` against the current nonce in constant time
    fn matches(&self, candidate: &str) -> bool {
        self.current()
            .is_some_and(|current| constant_time_eq(&current, candidate))
    }
}

/// In-process nonce slot guarded by a read-write lock
#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    current: RwLock<Option<String>>,
}

impl MemoryNonceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceStore for MemoryNonceStore {
    fn set(&self, nonce: String) {
        *self.current.write() = Some(nonce);
    }

    fn current(&self) -> Option<String> {
        self.current.read().clone()
    }

    fn matches(&self, candidate: &str) -> bool {
        self.current
            .read()
            .as_deref()
            .is_some_and(|current| constant_time_eq(current, candidate))
    }
}

/// Constant-time string comparison
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
