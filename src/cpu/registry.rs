use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

static GLOBAL_REGISTRY: Lazy<Arc<CoreRegistry>> = Lazy::new(|| Arc::new(CoreRegistry::new()));

/// The set of CPU core indices seen so far
///
/// Core count is a device property, so it is discovered from the `cpu<N>...` keys that show
/// up in the data rather than configured. The set only ever grows.
#[derive(Debug, Default)]
pub struct CoreRegistry {
    cores: RwLock<BTreeSet<usize>>,
}

impl CoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<CoreRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Records a core index, returning `true` the first time it is seen
    pub fn observe(&self, index: usize) -> bool {
        if self.cores.read().contains(&index) {
            return false;
        }
        self.cores.write().insert(index)
    }

    /// Known core indices in ascending order
    pub fn indices(&self) -> Vec<usize> {
        self.cores.read().iter().copied().collect()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.cores.read().contains(&index)
    }

    pub fn len(&self) -> usize {
        self.cores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.read().is_empty()
    }
}
