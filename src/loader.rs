//! Feed loading and query access to cached advisories.
//!
//! The [`FeedLoader`] orchestrates one reload pass: enumerate `*.notus` files
//! in the feed directory, verify each file's signature through the injected
//! [`FeedVerifier`], normalize every advisory and persist it through the
//! advisory store. Read operations never fail with "not loaded"; on a first
//! call they trigger a reload themselves, and while a pass is in flight they
//! wait for it to finish instead of starting a second one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

use crate::error::{AdvisoryError, Result};
use crate::models::{AdvisoryFile, CanonicalRecord};
use crate::normalize::normalize;
use crate::store::AdvisoryStore;

/// File extension of notus feed files.
pub const FEED_EXTENSION: &str = "notus";

/// Signature verification capability for feed files.
///
/// Implemented by the embedding process; the loader only consumes the verdict.
pub trait FeedVerifier: Send + Sync {
    fn verify(&self, path: &Path) -> bool;
}

impl<F> FeedVerifier for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn verify(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Verifier that accepts every file, for deployments with signature
/// verification disabled.
pub struct AcceptAll;

impl FeedVerifier for AcceptAll {
    fn verify(&self, _path: &Path) -> bool {
        true
    }
}

/// Load lifecycle of the feed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    /// Nothing loaded yet; the next read triggers a reload.
    Idle,
    /// A reload pass is in flight; readers wait for it.
    Loading,
    /// A pass completed; reads go straight to the store.
    Ready,
}

/// Loads the notus feed into the advisory store and serves queries against it.
pub struct FeedLoader {
    feed_dir: PathBuf,
    store: Arc<dyn AdvisoryStore>,
    verifier: Arc<dyn FeedVerifier>,
    state: Mutex<LoadState>,
    reload_done: Notify,
}

impl FeedLoader {
    pub fn new(
        feed_dir: impl Into<PathBuf>,
        store: Arc<dyn AdvisoryStore>,
        verifier: Arc<dyn FeedVerifier>,
    ) -> Self {
        Self {
            feed_dir: feed_dir.into(),
            store,
            verifier,
            state: Mutex::new(LoadState::Idle),
            reload_done: Notify::new(),
        }
    }

    /// Reload the cache from the feed directory.
    ///
    /// If another pass is already in flight, waits for it to finish and
    /// returns without starting a second one. Per-file verification and parse
    /// failures are logged and skipped; store failures abort the remaining
    /// pass and propagate. On every exit path the loader leaves the Loading
    /// state and wakes waiting readers.
    pub async fn reload_cache(&self) -> Result<()> {
        if !self.begin_loading() {
            self.wait_for_reload().await;
            return Ok(());
        }

        let result = self.run_pass().await;
        self.finish_loading(result.is_ok());
        result
    }

    /// True iff an advisory with the given oid is cached.
    pub async fn exists(&self, oid: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        self.store.exists(oid).await
    }

    /// The cached metadata record for an advisory, or `None` if unknown.
    pub async fn get_metadata(&self, oid: &str) -> Result<Option<CanonicalRecord>> {
        self.ensure_loaded().await?;
        self.store.get_advisory(oid).await
    }

    /// `(filename, oid)` pairs for every cached advisory.
    ///
    /// Entries whose record vanished between key scan and read are skipped.
    pub async fn filenames_and_oids(&self) -> Result<Vec<(String, String)>> {
        self.ensure_loaded().await?;
        let mut pairs = Vec::new();
        for oid in self.store.get_keys().await? {
            if let Some(record) = self.store.get_advisory(&oid).await? {
                pairs.push((record.filename, oid));
            }
        }
        Ok(pairs)
    }

    /// RFC 3339 time of the last completed reload pass, if any.
    pub async fn last_reload(&self) -> Result<Option<String>> {
        self.store.last_reload().await
    }

    /// Make sure a pass has completed before a read proceeds.
    ///
    /// Idle triggers a reload; Loading waits for the in-flight pass; Ready
    /// returns immediately without touching the feed.
    async fn ensure_loaded(&self) -> Result<()> {
        let state = *self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state {
            LoadState::Ready => Ok(()),
            LoadState::Idle | LoadState::Loading => self.reload_cache().await,
        }
    }

    /// Atomically claim the Loading state. Returns false when another pass
    /// already holds it.
    fn begin_loading(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == LoadState::Loading {
            return false;
        }
        *state = LoadState::Loading;
        true
    }

    fn finish_loading(&self, success: bool) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = if success {
                LoadState::Ready
            } else {
                LoadState::Idle
            };
        }
        self.reload_done.notify_waiters();
    }

    async fn wait_for_reload(&self) {
        loop {
            // Register before checking the state so a notify between check
            // and await cannot be missed.
            let notified = self.reload_done.notified();
            if *self.state.lock().unwrap_or_else(|e| e.into_inner()) != LoadState::Loading {
                return;
            }
            notified.await;
        }
    }

    #[instrument(skip(self), fields(feed_dir = %self.feed_dir.display()))]
    async fn run_pass(&self) -> Result<()> {
        let mut stored = 0usize;
        let mut entries = tokio::fs::read_dir(&self.feed_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FEED_EXTENSION) {
                continue;
            }
            if !self.verifier.verify(&path) {
                warn!("ignoring {} due to invalid signature", path.display());
                continue;
            }
            let file = match self.read_feed_file(&path).await {
                Ok(file) => file,
                Err(e) => {
                    // A single broken file must not sink the whole pass.
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            for advisory in &file.advisories {
                let record = normalize(&path, advisory, &file);
                self.store.store_advisory(&advisory.oid, &record).await?;
                stored += 1;
            }
            debug!(
                "loaded {} advisories from {}",
                file.advisories.len(),
                path.display()
            );
        }
        self.store.mark_reloaded().await?;
        info!("feed reload complete, {} advisories stored", stored);
        Ok(())
    }

    async fn read_feed_file(&self, path: &Path) -> Result<AdvisoryFile> {
        let data = tokio::fs::read(path).await?;
        serde_json::from_slice(&data)
            .map_err(|e| AdvisoryError::malformed_feed(path, e.to_string()))
    }
}
