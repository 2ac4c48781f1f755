use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::corpus::reference_corpus::ReferenceCorpus;

/// Holds the live reference corpus and publishes replacements atomically.
///
/// Readers take an `Arc` snapshot (the read guard is held only long enough
/// to clone the pointer) and classify against it with no lock held. A
/// replacement is built entirely outside the store and installed with a
/// single pointer swap, so a reader sees either the old corpus or the new
/// one, never a mix. Concurrent rebuilds are serialised by `rebuild_with`.
#[derive(Debug)]
pub struct CorpusStore {
    current: RwLock<Arc<ReferenceCorpus>>,
    rebuild: Mutex<()>,
}

impl CorpusStore {
    pub fn new(initial: ReferenceCorpus) -> Self {
        CorpusStore {
            current: RwLock::new(Arc::new(initial)),
            rebuild: Mutex::new(()),
        }
    }

    /// The corpus currently in effect.
    pub fn snapshot(&self) -> Arc<ReferenceCorpus> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `corpus`, returning the one it replaced.
    pub fn publish(&self, corpus: ReferenceCorpus) -> Arc<ReferenceCorpus> {
        self.swap(Arc::new(corpus))
    }

    fn swap(&self, next: Arc<ReferenceCorpus>) -> Arc<ReferenceCorpus> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Runs `build` while holding the rebuild lock and publishes its corpus.
    ///
    /// `build` also returns a side value (typically the load report), which
    /// is handed back together with the newly published snapshot.
    pub fn rebuild_with<T, F>(&self, build: F) -> (Arc<ReferenceCorpus>, T)
    where
        F: FnOnce() -> (ReferenceCorpus, T),
    {
        let _exclusive = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        let (corpus, extra) = build();
        let next = Arc::new(corpus);
        self.swap(next.clone());
        (next, extra)
    }
}

impl Default for CorpusStore {
    fn default() -> Self {
        CorpusStore::new(ReferenceCorpus::empty())
    }
}
