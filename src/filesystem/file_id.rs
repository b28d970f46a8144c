use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Source of identifiers for newly stored files.
///
/// Identifiers end up as file names on disk, so an implementation must only
/// produce valid path segments (see [`validate_name`](super::file_store::validate_name)).
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random hyphenated UUID v4 identifiers. Used unless a store is told otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix>-<n>` identifiers, counting up from zero.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
