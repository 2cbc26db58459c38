//! Counting admission gate bounding concurrent conversions.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Fair counting gate. Permits are granted in request order.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    permits: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate admitting at most `permits` requests at once.
    pub fn new(permits: NonZeroUsize) -> Self {
        let permits = permits.get().min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Wait for a permit. Fails with `Interrupted` once the gate is closed.
    pub async fn admit(&self) -> FxResult<Admission> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FxError::Interrupted)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        debug!(in_flight = now, "Request admitted");

        Ok(Admission {
            in_flight: self.in_flight.clone(),
            _permit: permit,
        })
    }

    /// Stop admitting. Waiting and future requests are interrupted.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether the gate has been closed.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Configured permit count.
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Requests currently past admission.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of requests ever past admission at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// A held permit. Dropping it releases the permit.
#[derive(Debug)]
pub struct Admission {
    in_flight: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Admission {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the count never exceeds permits.
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
