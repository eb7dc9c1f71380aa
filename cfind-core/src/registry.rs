//! Extension to extractor dispatch
//!
//! The registry owns one instance of each extractor for the duration of a run
//! and releases all of them exactly once, either through [`release_all`] or
//! when it is dropped (including while unwinding from a panic).
//!
//! [`release_all`]: StrategyRegistry::release_all

use std::collections::HashMap;

use crate::extractor::{default_extractors, normalize_extension, ContentExtractor};

/// Position of an extractor in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtractorId(usize);

impl ExtractorId {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        ExtractorId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

pub struct StrategyRegistry {
    extractors: Vec<Box<dyn ContentExtractor>>,
    /// Memoized decisions, including "no extractor"
    index: HashMap<String, Option<ExtractorId>>,
    lookups: usize,
    released: bool,
}

impl StrategyRegistry {
    /// Registry over `extractors`; earlier entries win ties
    pub fn new(extractors: Vec<Box<dyn ContentExtractor>>) -> Self {
        Self {
            extractors,
            index: HashMap::new(),
            lookups: 0,
            released: false,
        }
    }

    /// Word, spreadsheet (with the `office` feature) and plain text
    pub fn with_default_extractors() -> Self {
        Self::new(default_extractors())
    }

    /// Resolve an extension to its extractor, memoizing the result
    pub fn resolve(&mut self, extension: &str) -> Option<ExtractorId> {
        let key = normalize_extension(extension);
        if let Some(found) = self.index.get(&key) {
            return *found;
        }

        self.lookups += 1;
        let found = self
            .extractors
            .iter()
            .position(|e| e.matches_extension(&key))
            .map(ExtractorId);

        match found {
            Some(id) => tracing::debug!("Extension {:?} -> {}", key, self.extractors[id.0].name()),
            None => tracing::debug!("No extractor for extension {:?}", key),
        }

        self.index.insert(key, found);
        found
    }

    /// Number of uncached resolutions performed so far
    pub fn lookup_count(&self) -> usize {
        self.lookups
    }

    pub fn extractor_mut(&mut self, id: ExtractorId) -> Option<&mut (dyn ContentExtractor + 'static)> {
        self.extractors.get_mut(id.0).map(|e| e.as_mut())
    }

    pub fn name(&self, id: ExtractorId) -> &str {
        self.extractors
            .get(id.0)
            .map(|e| e.name())
            .unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release every extractor. Later calls do nothing.
    pub fn release_all(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        for extractor in self.extractors.iter_mut() {
            if let Err(e) = extractor.release() {
                tracing::error!("Failed to release {}: {}", extractor.name(), e);
            }
        }
        tracing::debug!("Released {} extractors", self.extractors.len());
    }
}

impl Drop for StrategyRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
