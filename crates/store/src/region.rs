//! Active region supplier.
//!
//! The store derives the active partition key fresh from the provider on
//! every current-region call rather than caching it, so a region change is
//! visible on the very next operation.

use std::sync::Mutex;

use regional_cart_core::RegionKey;

/// Supplies the currently selected (province, city) pair synchronously.
pub trait RegionProvider: Send + Sync {
    /// The active region key right now.
    fn current(&self) -> RegionKey;
}

/// A settable region provider for tests and embedders without their own
/// region-selection layer.
#[derive(Debug)]
pub struct StaticRegionProvider {
    current: Mutex<RegionKey>,
}

impl StaticRegionProvider {
    /// Create a provider fixed to the given region until [`set`](Self::set)
    /// is called.
    #[must_use]
    pub fn new(region: RegionKey) -> Self {
        Self {
            current: Mutex::new(region),
        }
    }

    /// Switch the active region.
    pub fn set(&self, region: RegionKey) {
        match self.current.lock() {
            Ok(mut guard) => *guard = region,
            Err(poisoned) => *poisoned.into_inner() = region,
        }
    }
}

impl RegionProvider for StaticRegionProvider {
    fn current(&self) -> RegionKey {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_is_visible_on_next_call() {
        let provider = StaticRegionProvider::new(RegionKey::new("江苏省", "南京市"));
        assert_eq!(provider.current(), RegionKey::new("江苏省", "南京市"));

        provider.set(RegionKey::new("广东省", "深圳市"));
        assert_eq!(provider.current(), RegionKey::new("广东省", "深圳市"));
    }
}
