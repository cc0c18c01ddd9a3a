// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the entity caches.

#[cfg(test)]
mod tests {
    use crate::entity_cache::{xml_digest, EntityCache, EntityCaches};
    use crate::resources::Volume;
    use std::sync::Arc;

    const VOLUME_XML: &str = "<volume><name>v</name><key>k</key><capacity>1</capacity>\
                              <target><path>/p</path></target></volume>";

    #[test]
    fn test_digest_is_content_addressed() {
        assert_eq!(xml_digest(VOLUME_XML), xml_digest(VOLUME_XML));
        assert_ne!(xml_digest(VOLUME_XML), xml_digest("<volume/>"));
    }

    #[test]
    fn test_same_xml_returns_same_view() {
        let cache: EntityCache<Volume> = EntityCache::new();

        let first = cache.get_or_parse(VOLUME_XML).unwrap();
        let second = cache.get_or_parse(VOLUME_XML).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_xml_gets_new_entry() {
        let cache: EntityCache<Volume> = EntityCache::new();

        let first = cache.get_or_parse(VOLUME_XML).unwrap();
        let second = cache
            .get_or_parse(&VOLUME_XML.replace("<capacity>1</capacity>", "<capacity>2</capacity>"))
            .unwrap();

        assert_eq!(first.capacity, 1);
        assert_eq!(second.capacity, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_parse_failures_are_not_cached() {
        let cache: EntityCache<Volume> = EntityCache::new();

        assert!(cache.get_or_parse("<volume>").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let caches = EntityCaches::default();
        caches.volumes.get_or_parse(VOLUME_XML).unwrap();

        caches.volumes.clear();

        assert!(caches.volumes.is_empty());
        assert!(caches.networks.is_empty());
    }
}
