//! Natural-key registry
//!
//! Maps an entity's natural key to its surrogate ref for the duration of one
//! unit of work (a bulk load or an upsert call). A registry is a plain value
//! owned by that unit of work and dropped with it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use catalog_common::EntityKind;
use tracing::trace;

/// Deduplicating map from natural key to surrogate ref
#[derive(Debug)]
pub struct NaturalKeyRegistry<K, R> {
    kind: EntityKind,
    refs: HashMap<K, R>,
    next_id: i64,
}

impl<K, R> NaturalKeyRegistry<K, R>
where
    K: Eq + Hash + std::fmt::Debug,
    R: Copy + From<i64>,
{
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            refs: HashMap::new(),
            next_id: 1,
        }
    }

    /// Ref for `key`, building the entity on first sight
    ///
    /// On a miss the next surrogate from the registry's own sequence is handed
    /// to `build`, which materializes and validates the entity. If `build`
    /// fails nothing is stored and the surrogate is not consumed. Later calls
    /// with the same key return the stored ref without calling `build`.
    pub fn resolve<E, F>(&mut self, key: K, build: F) -> Result<R, E>
    where
        F: FnOnce(R) -> Result<(), E>,
    {
        if let Some(existing) = self.refs.get(&key) {
            return Ok(*existing);
        }

        let candidate = R::from(self.next_id);
        build(candidate)?;

        trace!(kind = %self.kind, key = ?key, id = self.next_id, "Registered new entity");
        self.next_id += 1;
        self.refs.insert(key, candidate);
        Ok(candidate)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.refs.get(key).copied()
    }

    /// Remember a ref assigned outside the registry, e.g. by the store
    pub fn record(&mut self, key: K, id: R) {
        self.refs.insert(key, id);
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
