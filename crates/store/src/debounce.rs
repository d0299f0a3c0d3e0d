//! Debounced quantity edits.
//!
//! Wraps only the increase/decrease entrypoints - add/remove/clear persist
//! immediately and are never debounced. Rapid repeated calls on the same
//! (region, product) key within the window collapse to a single eventual
//! mutation reflecting the last requested direction. Guards are re-evaluated
//! against the authoritative store state at fire time, not at call time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regional_cart_core::{ProductId, RegionKey};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::CartStore;

/// Direction of a pending quantity step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Increase,
    Decrease,
}

struct PendingStep {
    direction: StepDirection,
    cancel: CancellationToken,
    generation: u64,
}

struct DebounceState {
    pending: HashMap<(RegionKey, ProductId), PendingStep>,
    next_generation: u64,
}

/// Per-key trailing-edge scheduler for quantity steps.
///
/// Must be used from within a Tokio runtime; each request spawns a delayed
/// task. Dropping the debouncer (or calling [`shutdown`](Self::shutdown))
/// cancels every pending timer so no mutation fires into a discarded scope.
pub struct QuantityDebouncer {
    store: Arc<CartStore>,
    delay: Duration,
    state: Arc<Mutex<DebounceState>>,
    shutdown: CancellationToken,
}

impl QuantityDebouncer {
    /// Wrap a store with the given trailing-edge delay.
    #[must_use]
    pub fn new(store: Arc<CartStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            state: Arc::new(Mutex::new(DebounceState {
                pending: HashMap::new(),
                next_generation: 0,
            })),
            shutdown: CancellationToken::new(),
        }
    }

    /// Schedule an increase for (region, product), collapsing any pending
    /// step on the same key.
    pub fn increase(&self, region: RegionKey, product_id: ProductId) {
        self.request(region, product_id, StepDirection::Increase);
    }

    /// Schedule a decrease for (region, product), collapsing any pending
    /// step on the same key.
    pub fn decrease(&self, region: RegionKey, product_id: ProductId) {
        self.request(region, product_id, StepDirection::Decrease);
    }

    /// Number of steps currently waiting for their window to elapse.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Cancel every pending timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        lock(&self.state).pending.clear();
    }

    fn request(&self, region: RegionKey, product_id: ProductId, direction: StepDirection) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let cancel = self.shutdown.child_token();
        let generation = {
            let mut state = lock(&self.state);
            let generation = state.next_generation;
            state.next_generation += 1;

            // Reschedule: the previous timer for this key never fires.
            if let Some(previous) = state.pending.insert(
                (region.clone(), product_id.clone()),
                PendingStep {
                    direction,
                    cancel: cancel.clone(),
                    generation,
                },
            ) {
                previous.cancel.cancel();
            }
            generation
        };

        let store = self.store.clone();
        let state = self.state.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => return,
                () = sleep(delay) => {}
            }

            // Claim the pending entry. A newer request may have replaced it
            // between the timer elapsing and this lock; in that case the
            // newer timer owns the key and this one stands down.
            let claimed = {
                let mut guard = lock(&state);
                let key = (region.clone(), product_id.clone());
                if guard
                    .pending
                    .get(&key)
                    .is_some_and(|step| step.generation == generation)
                {
                    guard.pending.remove(&key).map(|step| step.direction)
                } else {
                    None
                }
            };
            let Some(direction) = claimed else { return };

            // Guards run inside the store against fire-time state.
            let outcome = match direction {
                StepDirection::Increase => store.increase_quantity_in(&region, &product_id),
                StepDirection::Decrease => store.decrease_quantity_in(&region, &product_id),
            };
            if let Err(e) = outcome {
                debug!(%product_id, "debounced quantity step refused: {e}");
            }
        });
    }
}

impl Drop for QuantityDebouncer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn lock(state: &Mutex<DebounceState>) -> std::sync::MutexGuard<'_, DebounceState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
