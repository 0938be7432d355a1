use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::loader::{AcceptAll, FeedLoader, FeedVerifier};
use crate::models::Finding;
use crate::results::{ReportSink, ResultAggregator};
use crate::store::RedisStore;

/// Wires the advisory cache and result dispatch together from a [`Config`].
///
/// The embedding process supplies the two injected collaborators: the feed
/// signature verifier and the reporting sink. With verification disabled in
/// the configuration the verifier argument is ignored and every feed file is
/// accepted.
pub struct AdvisoryManager {
    loader: Arc<FeedLoader>,
    aggregator: ResultAggregator,
}

impl AdvisoryManager {
    pub fn new(
        config: &Config,
        verifier: Arc<dyn FeedVerifier>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self> {
        let store = Arc::new(RedisStore::new(
            &config.redis_url,
            config.key_prefix.clone(),
        )?);
        let verifier: Arc<dyn FeedVerifier> = if config.disable_advisory_verification {
            Arc::new(AcceptAll)
        } else {
            verifier
        };
        let loader = Arc::new(FeedLoader::new(config.feed_dir.clone(), store, verifier));

        Ok(Self {
            loader,
            aggregator: ResultAggregator::new(sink),
        })
    }

    /// The feed loader serving advisory queries.
    pub fn loader(&self) -> &Arc<FeedLoader> {
        &self.loader
    }

    /// The aggregator absorbing scan findings.
    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    /// Force a feed reload, for feed-update notifications from the scanner.
    pub async fn reload(&self) -> Result<()> {
        self.loader.reload_cache().await
    }

    /// Forward one finding into the per-session batching.
    pub fn handle_result(&self, finding: &Finding) -> Result<()> {
        self.aggregator.handle_result(finding)
    }
}
