// Render admission gate
//
// Bounds the number of renderer processes alive at once. Callers wait for a
// permit; the executor contract is unchanged.

use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RenderGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Held for the duration of one render; released on drop
#[derive(Debug)]
pub struct RenderPermit {
    _permit: OwnedSemaphorePermit,
}

impl RenderGate {
    /// A capacity of 0 is raised to 1 so submissions cannot wait forever
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    pub async fn acquire(&self) -> Result<RenderPermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("render gate closed: {}", e)))?;
        debug!(in_use = self.in_use(), capacity = self.capacity, "Render permit acquired");
        Ok(RenderPermit { _permit: permit })
    }
}
