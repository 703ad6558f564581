use crate::{summarize, FlowRecord, HistoryStore, RateSample, RateSummary};
use qosmate_config::Config;
use std::time::Duration;
use tracing::debug;

/// A flow record annotated with the rates derived for the current poll.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedFlow {
    pub record: FlowRecord,
    pub instant_pps: u64,
    pub instant_bps: u64,
    pub avg_pps: u64,
    pub max_pps: u64,
    pub avg_bps: u64,
}

impl EnrichedFlow {
    fn new(record: FlowRecord, instant: RateSample, summary: RateSummary) -> Self {
        Self {
            record,
            instant_pps: instant.pps,
            instant_bps: instant.bps,
            avg_pps: summary.avg_pps,
            max_pps: summary.max_pps,
            avg_bps: summary.avg_bps,
        }
    }
}

/// Per-view aggregation state: the flow histories and the most recently
/// produced list. Build one when a view starts and drop it when it ends.
#[derive(Debug)]
pub struct FlowEngine {
    history: HistoryStore,
    flow_timeout: Option<Duration>,
    latest: Vec<EnrichedFlow>,
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self::new(HistoryStore::default(), None)
    }
}

impl FlowEngine {
    pub fn new(history: HistoryStore, flow_timeout: Option<Duration>) -> Self {
        Self {
            history,
            flow_timeout,
            latest: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(HistoryStore::new(config.history_length), config.flow_timeout())
    }

    /// Feeds a complete snapshot taken at wall-clock time `now` (seconds)
    /// through the histories and returns the enriched list, in snapshot
    /// order.
    pub fn ingest(&mut self, records: Vec<FlowRecord>, now: f64) -> &[EnrichedFlow] {
        let mut enriched = Vec::with_capacity(records.len());
        for record in records {
            let instant = self.history.update(&record, now);
            let summary = self
                .history
                .get(&record.key)
                .map(summarize)
                .unwrap_or_default();
            enriched.push(EnrichedFlow::new(record, instant, summary));
        }

        if let Some(timeout) = self.flow_timeout {
            let expired = self.history.expire(now, timeout);
            if expired > 0 {
                debug!("Expired {expired} idle flows, {} still tracked", self.history.len());
            }
        }

        self.latest = enriched;
        &self.latest
    }

    /// The list produced by the last successful [`FlowEngine::ingest`].
    pub fn latest(&self) -> &[EnrichedFlow] {
        &self.latest
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}
