// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Content-addressed caches of parsed backend descriptions.
//!
//! Entries are keyed by the SHA-256 of the raw XML text. An object whose
//! description changes produces a new key, so entries are never invalidated.
//! The caches are unbounded: memory grows with the number of distinct
//! descriptions seen over the life of the process.

use crate::errors::Result;
use crate::metrics::{record_cache_hit, record_cache_miss};
use crate::resources::{Domain, FromXml, Network, Volume};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// SHA-256 of an XML description
pub type XmlDigest = [u8; 32];

/// Hash an XML description into a cache key.
#[must_use]
pub fn xml_digest(xml: &str) -> XmlDigest {
    Sha256::digest(xml.as_bytes()).into()
}

/// Parsed views of one entity kind, shared between concurrent requests.
#[derive(Debug)]
pub struct EntityCache<T> {
    entries: DashMap<XmlDigest, Arc<T>>,
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: FromXml> EntityCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the view for `xml`, parsing it on first sight.
    ///
    /// # Errors
    ///
    /// Returns the parse error of `T::from_xml`; failures are not cached.
    pub fn get_or_parse(&self, xml: &str) -> Result<Arc<T>> {
        let digest = xml_digest(xml);
        if let Some(entry) = self.entries.get(&digest) {
            record_cache_hit(T::KIND);
            return Ok(Arc::clone(entry.value()));
        }

        record_cache_miss(T::KIND);
        let parsed = Arc::new(T::from_xml(xml)?);
        debug!(kind = T::KIND, entries = self.entries.len() + 1, "Cached parsed description");
        Ok(Arc::clone(
            self.entries.entry(digest).or_insert(parsed).value(),
        ))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// One cache per entity kind.
#[derive(Debug, Default)]
pub struct EntityCaches {
    pub volumes: EntityCache<Volume>,
    pub domains: EntityCache<Domain>,
    pub networks: EntityCache<Network>,
}

#[cfg(test)]
#[path = "entity_cache_tests.rs"]
mod entity_cache_tests;
