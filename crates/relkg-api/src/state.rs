//! Application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use relkg_backends::{CacheStats, CachedResolver, HfTokenizer, HttpGenerator, WikipediaResolver};
use relkg_core::{AppConfig, Result};
use relkg_extractor::Extractor;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Extraction pipeline
    pub extractor: Extractor,
    /// Entity lookup cache statistics, when a cached resolver is in use
    pub resolver_stats: Option<Arc<CacheStats>>,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Completed extractions
    pub extraction_count: AtomicU64,
}

impl AppState {
    /// Create state around an already assembled extractor
    pub fn new(config: AppConfig, extractor: Extractor) -> Self {
        Self {
            config,
            extractor,
            resolver_stats: None,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            extraction_count: AtomicU64::new(0),
        }
    }

    /// Build the HTTP generator, tokenizer and cached Wikipedia resolver
    /// described by `config`
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let generator = HttpGenerator::from_config(&config.generator)?;
        let tokenizer = HfTokenizer::from_file(&config.generator.tokenizer_path)?;
        let resolver = CachedResolver::new(
            WikipediaResolver::from_config(&config.resolver)?,
            config.resolver.cache_capacity,
        );
        let resolver_stats = resolver.stats();

        let extractor = Extractor::new(
            Arc::new(generator),
            Arc::new(tokenizer),
            config.extraction.clone(),
        )?
        .with_resolver(Arc::new(resolver));

        tracing::info!(
            generator = %config.generator.endpoint,
            resolver = %config.resolver.api_url,
            window_length = config.extraction.window_length,
            "Extraction backends initialized"
        );

        Ok(Self {
            resolver_stats: Some(resolver_stats),
            ..Self::new(config, extractor)
        })
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn record_extraction(&self) {
        self.extraction_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get_extraction_count(&self) -> u64 {
        self.extraction_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
