//! Caller-owned cache for loaded certificate material

use crate::models::CertificateMaterial;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the last successfully loaded material.
///
/// Values are replaced wholesale; readers observe either the previous
/// complete value, the new one, or nothing.
#[derive(Debug, Default)]
pub struct CertificateCache {
    slot: RwLock<Option<Arc<CertificateMaterial>>>,
}

impl CertificateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<CertificateMaterial>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `material`, returning the shared handle now held by the cache
    pub fn set(&self, material: CertificateMaterial) -> Arc<CertificateMaterial> {
        let material = Arc::new(material);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&material));
        material
    }

    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::thread;

    fn material(thumbprint: &str) -> CertificateMaterial {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        CertificateMaterial {
            private_key_pem: String::new(),
            certificate_pem: String::new(),
            thumbprint: thumbprint.to_string(),
            fingerprint_sha256: String::new(),
            subject: "CN=test".to_string(),
            issuer: "CN=test".to_string(),
            serial: "01".to_string(),
            not_before: now,
            not_after: now,
            is_valid: true,
            days_to_expire: 0,
            loaded_at: now,
        }
    }

    #[test]
    fn test_set_get_invalidate() {
        let cache = CertificateCache::new();
        assert!(cache.get().is_none());

        cache.set(material("AAAA"));
        assert_eq!(cache.get().unwrap().thumbprint, "AAAA");

        cache.set(material("BBBB"));
        assert_eq!(cache.get().unwrap().thumbprint, "BBBB");

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_whole_values() {
        let cache = Arc::new(CertificateCache::new());
        cache.set(material("AAAA"));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            cache.set(material(if i == 0 { "AAAA" } else { "BBBB" }));
                        } else if let Some(m) = cache.get() {
                            assert!(m.thumbprint == "AAAA" || m.thumbprint == "BBBB");
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.get().is_some());
    }
}
