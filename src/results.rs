//! Aggregation of scan findings into per-session batches.
//!
//! Findings stream in from concurrent scan sessions. The first finding for a
//! session opens a buffer and schedules one flush after the quiet period;
//! findings arriving inside the window join the buffer without rescheduling.
//! The flush removes the buffer atomically and hands the whole batch to the
//! [`ReportSink`] in a single call. A failed delivery is logged and the batch
//! is dropped; findings are never retried or re-queued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Finding;

/// Delay after the first finding of a batch before the batch is flushed.
pub const QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Delivery target for finished batches.
///
/// Returns true when the batch was accepted. The aggregator trusts this
/// verdict; a false return means the findings are lost.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report(&self, results: Vec<serde_json::Value>, scan_id: &str) -> bool;
}

/// Batches findings per scan session with a quiet-period timer.
///
/// Cheap to clone; clones share the buffer map. Must be used inside a tokio
/// runtime since flushes run as spawned tasks.
#[derive(Clone)]
pub struct ResultAggregator {
    inner: Arc<Inner>,
}

struct Inner {
    buffers: Mutex<HashMap<String, Vec<serde_json::Value>>>,
    sink: Arc<dyn ReportSink>,
    quiet_period: Duration,
}

impl ResultAggregator {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self::with_quiet_period(sink, QUIET_PERIOD)
    }

    /// Aggregator with a custom quiet period. Tests shrink the window.
    pub fn with_quiet_period(sink: Arc<dyn ReportSink>, quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                buffers: Mutex::new(HashMap::new()),
                sink,
                quiet_period,
            }),
        }
    }

    /// Absorb one finding.
    ///
    /// Serializes the finding (without its `scan_id`, which keys the batch)
    /// and appends it to the session's buffer. The buffer check, append and
    /// flush scheduling form one critical section, so a finding racing a
    /// flush either joins the departing batch or opens a fresh one.
    pub fn handle_result(&self, finding: &Finding) -> Result<()> {
        let mut record = serde_json::to_value(finding)?;
        if let Some(map) = record.as_object_mut() {
            map.remove("scan_id");
        }
        let scan_id = finding.scan_id.clone();

        let opened_window = {
            let mut buffers = self
                .inner
                .buffers
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let first = !buffers.contains_key(&scan_id);
            buffers.entry(scan_id.clone()).or_default().push(record);
            first
        };

        if opened_window {
            debug!("opening result window for scan {}", scan_id);
            let inner = self.inner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(inner.quiet_period).await;
                inner.flush(&scan_id).await;
            });
        }
        Ok(())
    }
}

impl Inner {
    async fn flush(&self, scan_id: &str) {
        let batch = self
            .buffers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(scan_id);
        let Some(batch) = batch else {
            return;
        };
        let count = batch.len();
        if !self.sink.report(batch, scan_id).await {
            warn!(
                "unable to report {} notus results for scan id {}",
                count, scan_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records every delivery and answers with a fixed verdict.
    struct RecordingSink {
        calls: Mutex<Vec<(Vec<serde_json::Value>, String)>>,
        accept: bool,
    }

    impl RecordingSink {
        fn accepting() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                accept: true,
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                accept: false,
            })
        }

        fn calls(&self) -> Vec<(Vec<serde_json::Value>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn report(&self, results: Vec<serde_json::Value>, scan_id: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((results, scan_id.to_string()));
            self.accept
        }
    }

    fn finding(scan_id: &str, value: &str) -> Finding {
        Finding {
            scan_id: scan_id.to_string(),
            host_ip: "192.0.2.1".to_string(),
            host_name: "host.example".to_string(),
            oid: "1.2.3.4".to_string(),
            port: "22/tcp".to_string(),
            result_type: "ALARM".to_string(),
            value: value.to_string(),
            uri: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_findings_within_window_form_one_batch() {
        let sink = RecordingSink::accepting();
        let aggregator = ResultAggregator::new(sink.clone());

        aggregator.handle_result(&finding("s1", "first")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        aggregator.handle_result(&finding("s1", "second")).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        let (batch, scan_id) = &calls[0];
        assert_eq!(scan_id, "s1");
        assert_eq!(batch.len(), 2);
        // Arrival order is preserved.
        assert_eq!(batch[0]["value"], "first");
        assert_eq!(batch[1]["value"], "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_finding_after_window_starts_new_batch() {
        let sink = RecordingSink::accepting();
        let aggregator = ResultAggregator::new(sink.clone());

        aggregator.handle_result(&finding("s1", "first")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        aggregator.handle_result(&finding("s1", "late")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0.len(), 1);
        assert_eq!(calls[1].0.len(), 1);
        assert_eq!(calls[1].0[0]["value"], "late");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_batch_independently() {
        let sink = RecordingSink::accepting();
        let aggregator = ResultAggregator::new(sink.clone());

        aggregator.handle_result(&finding("s1", "a")).unwrap();
        aggregator.handle_result(&finding("s2", "b")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        let mut ids: Vec<_> = calls.iter().map(|(_, id)| id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_id_stripped_from_records() {
        let sink = RecordingSink::accepting();
        let aggregator = ResultAggregator::new(sink.clone());

        aggregator.handle_result(&finding("s1", "a")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let calls = sink.calls();
        let record = &calls[0].0[0];
        assert!(record.get("scan_id").is_none());
        assert_eq!(record["oid"], "1.2.3.4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delivery_drops_batch_without_retry() {
        let sink = RecordingSink::rejecting();
        let aggregator = ResultAggregator::new(sink.clone());

        aggregator.handle_result(&finding("s1", "a")).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        // Exactly one attempt, and the buffer is gone.
        assert_eq!(sink.calls().len(), 1);
        assert!(aggregator.inner.buffers.lock().unwrap().is_empty());

        // The next finding opens a fresh cycle.
        aggregator.handle_result(&finding("s1", "b")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sink.calls().len(), 2);
    }
}
