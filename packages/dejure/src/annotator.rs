//! Annotation pipeline: detection, cache lookup, fetch, verification and
//! cache write.
//!
//! [`Annotator::annotate`] never fails. Whenever the service cannot be
//! reached, answers with an error, or returns text that does not pass
//! [`crate::verify::verify`], the original text is returned unchanged.

use std::path::Path;

use crate::cache::{CacheDriver, CacheStore};
use crate::client::{AnnotationService, DejureClient};
use crate::config::AnnotationConfig;
use crate::detect::has_citation;
use crate::error::{CacheError, Result};
use crate::fingerprint::Fingerprint;
use crate::verify::verify;

/// Outcome of [`Annotator::annotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationResult {
    /// Linked text, or the original text if linking failed.
    pub text: String,
    /// Whether `text` was loaded from the cache.
    pub served_from_cache: bool,
}

impl AnnotationResult {
    fn fresh(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            served_from_cache: false,
        }
    }

    fn cached(text: String) -> Self {
        Self {
            text,
            served_from_cache: true,
        }
    }
}

/// Links citations in texts and caches the results.
///
/// Holds an immutable configuration plus handles to a cache store and an
/// annotation service. Safe to share across threads when both handles are.
pub struct Annotator<C, S> {
    config: AnnotationConfig,
    cache: C,
    service: S,
}

impl Annotator<Box<dyn CacheStore>, DejureClient> {
    /// Create an annotator talking to dejure.org over HTTP.
    ///
    /// Fails if the cache driver cannot be opened or the HTTP client
    /// cannot be built.
    pub fn with_http(
        config: AnnotationConfig,
        driver: CacheDriver,
        storage: &Path,
    ) -> Result<Self> {
        let cache = driver.open(storage)?;
        let service = DejureClient::new(&config)?;
        Ok(Self::new(config, cache, service))
    }
}

impl<C: CacheStore, S: AnnotationService> Annotator<C, S> {
    /// Create an annotator from a configuration, cache store and service.
    pub fn new(config: AnnotationConfig, cache: C, service: S) -> Self {
        Self {
            config,
            cache,
            service,
        }
    }

    /// The configuration this annotator was created with.
    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    /// The cache store holding annotated texts.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Link all citations in `text`.
    ///
    /// `ignore` lists judicial file numbers the service should leave
    /// unlinked (may be empty).
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    pub fn annotate(&self, text: &str, ignore: &str) -> AnnotationResult {
        if !has_citation(text) {
            tracing::debug!("No citations found, skipping");
            return AnnotationResult::fresh(text);
        }

        let text = text.trim();
        let fingerprint = Fingerprint::of(text);

        if let Some(cached) = self.lookup(&fingerprint) {
            tracing::debug!(fingerprint = %fingerprint, "Serving annotated text from cache");
            return AnnotationResult::cached(cached);
        }

        let response = match self.service.fetch(text, ignore, &self.config) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Annotation request failed, returning original text");
                return AnnotationResult::fresh(text);
            }
        };

        if let Err(e) = verify(text, &response) {
            tracing::warn!(error = %e, "Annotated text failed verification, returning original text");
            return AnnotationResult::fresh(text);
        }

        if let Err(e) = self.cache.set(
            fingerprint.as_str(),
            &response,
            self.config.cache_ttl_seconds(),
        ) {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Failed to cache annotated text");
        }

        AnnotationResult::fresh(response)
    }

    /// Remove all cached results.
    pub fn clear_cache(&self) -> std::result::Result<bool, CacheError> {
        self.cache.clear()
    }

    /// Cache read where any store error counts as a miss.
    fn lookup(&self, fingerprint: &Fingerprint) -> Option<String> {
        let key = fingerprint.as_str();
        let cached = match self.cache.has(key) {
            Ok(true) => self.cache.get(key),
            Ok(false) => return None,
            Err(e) => Err(e),
        };

        match cached {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    use crate::cache::MemoryCache;
    use crate::client::test_support::MockService;
    use crate::error::FetchError;

    const TEXT: &str = "§ 433 BGB regelt den Kauf.";
    const LINKED: &str = r#"<a href="https://dejure.org/gesetze/BGB/433.html" title="§ 433 BGB: Vertragstypische Pflichten beim Kaufvertrag">§ 433 BGB</a> regelt den Kauf."#;

    fn annotator(service: MockService) -> Annotator<Arc<MemoryCache>, MockService> {
        let config = AnnotationConfig::builder("example.org").build();
        Annotator::new(config, Arc::new(MemoryCache::new()), service)
    }

    /// Store that fails every operation.
    struct BrokenCache;

    impl CacheStore for BrokenCache {
        fn has(&self, _key: &str) -> std::result::Result<bool, CacheError> {
            Err(CacheError::Poisoned("broken".into()))
        }

        fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
            Err(CacheError::Poisoned("broken".into()))
        }

        fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: u64,
        ) -> std::result::Result<bool, CacheError> {
            Err(CacheError::Poisoned("broken".into()))
        }

        fn clear(&self) -> std::result::Result<bool, CacheError> {
            Err(CacheError::Poisoned("broken".into()))
        }
    }

    #[test]
    fn test_text_without_citation_is_untouched() {
        let annotator = annotator(MockService::with_response(LINKED));
        let text = "  Nothing to link here.  ";

        let result = annotator.annotate(text, "");

        assert_eq!(result, AnnotationResult::fresh(text));
        assert_eq!(annotator.service.calls(), 0);
        assert!(annotator.cache().is_empty().unwrap());
    }

    #[test]
    fn test_successful_annotation_is_cached() {
        let annotator = annotator(MockService::with_response(LINKED));

        let first = annotator.annotate(TEXT, "");
        assert_eq!(first.text, LINKED);
        assert!(!first.served_from_cache);

        let second = annotator.annotate(TEXT, "");
        assert_eq!(second.text, LINKED);
        assert!(second.served_from_cache);

        assert_eq!(annotator.service.calls(), 1);
        assert_eq!(
            annotator.cache().get(Fingerprint::of(TEXT).as_str()).unwrap(),
            Some(LINKED.to_string())
        );
    }

    #[test]
    fn test_huge_cache_duration_never_expires() {
        let config = AnnotationConfig::builder("example.org")
            .cache_duration_days(u64::MAX)
            .build();
        let annotator = Annotator::new(
            config,
            Arc::new(MemoryCache::new()),
            MockService::with_response(LINKED),
        );

        let first = annotator.annotate(TEXT, "");
        assert_eq!(first, AnnotationResult::fresh(LINKED));

        let second = annotator.annotate(TEXT, "");
        assert_eq!(second, AnnotationResult::cached(LINKED.to_string()));
        assert_eq!(annotator.service.calls(), 1);
    }

    #[test]
    fn test_input_is_trimmed_before_fingerprinting() {
        let annotator = annotator(MockService::with_response(LINKED));

        annotator.annotate(&format!("\n  {TEXT}  \n"), "");
        let again = annotator.annotate(TEXT, "");

        assert!(again.served_from_cache);
    }

    #[test]
    fn test_fetch_failure_falls_back() {
        let annotator = annotator(MockService::failing(FetchError::Status(500)));

        let result = annotator.annotate(TEXT, "");

        assert_eq!(result, AnnotationResult::fresh(TEXT));
        assert!(annotator.cache().is_empty().unwrap());
    }

    #[test]
    fn test_truncated_response_falls_back() {
        let annotator = annotator(MockService::with_response("§ 433 BGB"));

        let result = annotator.annotate(TEXT, "");

        assert_eq!(result, AnnotationResult::fresh(TEXT));
        assert!(annotator.cache().is_empty().unwrap());
    }

    #[test]
    fn test_modified_response_falls_back() {
        let tampered = r#"<a href="https://dejure.org/gesetze/BGB/433.html">§ 433 BGB</a> regelt den Tausch!"#;
        let annotator = annotator(MockService::with_response(tampered));

        let result = annotator.annotate(TEXT, "");

        assert_eq!(result, AnnotationResult::fresh(TEXT));
        assert!(annotator.cache().is_empty().unwrap());
    }

    #[test]
    fn test_fallback_is_not_cached_and_retried() {
        let annotator = annotator(MockService::new(vec![
            Err(FetchError::Status(502)),
            Ok(LINKED.to_string()),
        ]));

        assert_eq!(annotator.annotate(TEXT, "").text, TEXT);
        let result = annotator.annotate(TEXT, "");

        assert_eq!(result.text, LINKED);
        assert!(!result.served_from_cache);
        assert_eq!(annotator.service.calls(), 2);
    }

    #[test]
    fn test_broken_cache_does_not_break_annotation() {
        let config = AnnotationConfig::builder("example.org").build();
        let annotator = Annotator::new(config, BrokenCache, MockService::with_response(LINKED));

        let result = annotator.annotate(TEXT, "");

        assert_eq!(result, AnnotationResult::fresh(LINKED));
        assert!(annotator.clear_cache().is_err());
    }

    #[test]
    fn test_clear_cache() {
        let annotator = annotator(MockService::new(vec![Ok(LINKED.into()), Ok(LINKED.into())]));

        annotator.annotate(TEXT, "");
        assert!(annotator.clear_cache().unwrap());

        let result = annotator.annotate(TEXT, "");
        assert!(!result.served_from_cache);
        assert_eq!(annotator.service.calls(), 2);
    }

    #[test]
    fn test_shared_across_threads() {
        let annotator = Arc::new(annotator(MockService::new(
            (0..4).map(|_| Ok(LINKED.to_string())).collect(),
        )));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let annotator = Arc::clone(&annotator);
                std::thread::spawn(move || annotator.annotate(TEXT, ""))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().text, LINKED);
        }
    }

    #[test]
    fn test_with_http_memory_driver() {
        let config = AnnotationConfig::builder("example.org").build();
        let annotator = Annotator::with_http(
            config.clone(),
            CacheDriver::Memory,
            Path::new("./.cache"),
        )
        .unwrap();
        assert_eq!(annotator.config(), &config);
    }
}
