//! A shared cache of compiled expressions.

use std::sync::{Arc, Mutex};

use hashlink::LruCache;

use crate::compile::{CompiledXPath, NamespaceBindings, compile};
use crate::error::Result;

const DEFAULT_CAPACITY: usize = 128;

type CacheKey = (String, Vec<(String, String)>);

/// Least-recently-used cache of compiled expressions, keyed on the
/// expression text and its namespace bindings.
///
/// Failed compilations are not cached.
pub struct XPathCache {
    entries: Mutex<LruCache<CacheKey, Arc<CompiledXPath>>>,
}

impl XPathCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity.max(1))),
        }
    }

    /// Return the cached compilation of `expression`, compiling it on a miss.
    pub fn get_or_compile(
        &self,
        expression: &str,
        bindings: &NamespaceBindings,
    ) -> Result<Arc<CompiledXPath>> {
        let key = (expression.to_string(), bindings.to_pairs());
        if let Some(hit) = self.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        // Compile outside the lock; a racing thread may insert the same entry.
        let compiled = Arc::new(compile(expression, bindings)?);
        self.lock().insert(key, Arc::clone(&compiled));
        tracing::trace!(expression, "Cached compiled XPath");
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, Arc<CompiledXPath>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for XPathCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for XPathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XPathCache").field("len", &self.len()).finish()
    }
}
