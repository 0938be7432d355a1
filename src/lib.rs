//! Advisory cache and scan-result dispatch for a Notus-based vulnerability
//! scanner.
//!
//! The crate ingests a directory of signed notus feed files, normalizes each
//! advisory into a canonical record, persists the records in a Redis-protocol
//! key-value store and serves lookups to the scanning engine. Finding events
//! emitted during a scan are batched per session with a quiet-period timer
//! before delivery to a reporting sink.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod models;
pub mod normalize;
pub mod results;
pub mod store;

pub use config::Config;
pub use error::{AdvisoryError, Result};
pub use loader::{FeedLoader, FeedVerifier};
pub use manager::AdvisoryManager;
pub use models::{CanonicalRecord, Finding};
pub use results::{ReportSink, ResultAggregator};
pub use store::{AdvisoryStore, MemoryStore, RedisStore};
