//! relkg Backends - Concrete collaborators for the extraction pipeline
//!
//! - [`HttpGenerator`]: beam-search generation served over HTTP
//! - [`HfTokenizer`]: Hugging Face `tokenizer.json` tokenizer
//! - [`WikipediaResolver`]: exact-title entity lookup against MediaWiki
//! - [`CachedResolver`]: memoizing wrapper for any resolver

pub mod cache;
pub mod generator;
pub mod tokenizer;
pub mod wikipedia;

pub use cache::{CacheStats, CacheStatsReport, CachedResolver};
pub use generator::HttpGenerator;
pub use tokenizer::HfTokenizer;
pub use wikipedia::WikipediaResolver;
