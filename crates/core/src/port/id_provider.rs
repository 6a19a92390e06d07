// ID Provider Port (for deterministic testing)

use crate::domain::JobId;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new, collision-resistant job ID
    fn generate_id(&self) -> JobId;
}

/// UUID v4 provider (production): 122 random bits per id
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> JobId {
        JobId::parse(uuid::Uuid::new_v4().to_string())
            .unwrap_or_else(|e| unreachable!("uuid strings are valid job ids: {e}"))
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic ids: `<prefix>-1`, `<prefix>-2`, ...
    pub struct SequentialIdProvider {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIdProvider {
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> JobId {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            JobId::parse(format!("{}-{}", self.prefix, n))
                .unwrap_or_else(|e| panic!("invalid test id prefix: {e}"))
        }
    }
}
