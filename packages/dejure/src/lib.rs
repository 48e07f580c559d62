//! RegelRecht dejure - Link statutory citations in legal texts via dejure.org.
//!
//! This crate sends legal prose to the dejure.org linking service, which
//! wraps citations like `§ 433 BGB` or `Art. 12 GG` in hyperlinks. Results
//! are verified before use and cached by content, and every failure falls
//! back to the original text.
//!
//! # Example
//!
//! ```
//! use regelrecht_dejure::cache::MemoryCache;
//! use regelrecht_dejure::client::DejureClient;
//! use regelrecht_dejure::config::{AnnotationConfig, LinkStyle};
//! use regelrecht_dejure::Annotator;
//!
//! let config = AnnotationConfig::builder("example.org")
//!     .link_style("schmal".parse::<LinkStyle>().unwrap())
//!     .build();
//! let client = DejureClient::new(&config).unwrap();
//! let annotator = Annotator::new(config, MemoryCache::new(), client);
//!
//! // No citation markers: returned as-is without any network access
//! let result = annotator.annotate("Nothing to link here.", "");
//! assert_eq!(result.text, "Nothing to link here.");
//! assert!(!result.served_from_cache);
//! ```
//!
//! # Architecture
//!
//! - [`detect`]: Citation pre-check
//! - [`fingerprint`]: Content-addressed cache keys
//! - [`cache`]: Cache store contract and backends
//! - [`config`]: Display options and connection settings
//! - [`client`]: HTTP client for the linking service
//! - [`verify`]: Integrity checks for returned text
//! - [`annotator`]: The annotation pipeline
//! - [`error`]: Error types and Result alias

pub mod annotator;
pub mod cache;
pub mod client;
pub mod config;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod verify;

// Re-export commonly used items
pub use annotator::{AnnotationResult, Annotator};
pub use cache::{CacheDriver, CacheEntry, CacheStore};
pub use client::{AnnotationService, DejureClient};
pub use config::{AnnotationConfig, LineBreak, LinkStyle, Tooltip};
pub use error::{CacheError, ConfigError, DejureError, FetchError, IntegrityError, Result};
pub use fingerprint::Fingerprint;
