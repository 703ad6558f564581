use crate::{FlowKey, FlowRecord};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

/// Number of instantaneous samples kept per flow unless configured
/// otherwise.
pub const DEFAULT_HISTORY_LENGTH: usize = 10;

/// One instantaneous rate measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateSample {
    /// Packets per second
    pub pps: u64,
    /// Bytes per second
    pub bps: u64,
}

/// Bounded rate history for a single flow, plus the cumulative counters
/// the next delta is taken against.
#[derive(Debug, Clone)]
pub struct FlowHistory {
    samples: VecDeque<RateSample>,
    last_packets: u64,
    last_bytes: u64,
    last_timestamp: f64,
    last_instant: RateSample,
}

impl FlowHistory {
    fn new(record: &FlowRecord, now: f64, capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            last_packets: record.packets,
            last_bytes: record.bytes,
            last_timestamp: now,
            last_instant: RateSample::default(),
        }
    }

    /// Samples in the order they were recorded, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &RateSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Wall-clock time (seconds) of the last snapshot that contained this flow.
    pub fn last_seen(&self) -> f64 {
        self.last_timestamp
    }

    fn push(&mut self, sample: RateSample, capacity: usize) {
        while self.samples.len() >= capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

/// Owns the history of every flow seen during the lifetime of a view.
#[derive(Debug)]
pub struct HistoryStore {
    histories: HashMap<FlowKey, FlowHistory>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH)
    }
}

impl HistoryStore {
    /// Creates an empty store keeping up to `capacity` samples per flow.
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            histories: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a new cumulative sample for a flow and returns its
    /// instantaneous rates.
    ///
    /// * A flow seen for the first time only establishes the baseline and
    ///   reports `(0, 0)`; nothing is added to its window.
    /// * If no time has passed since the previous sample (or the clock went
    ///   backwards) the previous instantaneous rates are reported again and
    ///   the window is left alone.
    /// * Counters lower than last time mean conntrack recreated the entry;
    ///   the delta is clamped to zero rather than going negative.
    ///
    /// The stored counters and timestamp always move to the new sample.
    pub fn update(&mut self, record: &FlowRecord, now: f64) -> RateSample {
        let capacity = self.capacity;
        let Some(history) = self.histories.get_mut(&record.key) else {
            self.histories
                .insert(record.key.clone(), FlowHistory::new(record, now, capacity));
            return RateSample::default();
        };

        let dt = now - history.last_timestamp;
        let instant = if dt > 0.0 {
            let packet_delta = record.packets.saturating_sub(history.last_packets);
            let byte_delta = record.bytes.saturating_sub(history.last_bytes);
            let sample = RateSample {
                pps: (packet_delta as f64 / dt).round() as u64,
                bps: (byte_delta as f64 / dt).round() as u64,
            };
            history.push(sample, capacity);
            history.last_instant = sample;
            sample
        } else {
            debug!(
                "Non-positive interval ({dt:.3}s) for {} -> {}, keeping previous rates",
                record.key.source_endpoint(),
                record.key.destination_endpoint()
            );
            history.last_instant
        };

        history.last_packets = record.packets;
        history.last_bytes = record.bytes;
        history.last_timestamp = now;
        instant
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowHistory> {
        self.histories.get(key)
    }

    /// Forgets every flow whose last snapshot is older than `timeout`.
    /// Returns the number of flows removed.
    pub fn expire(&mut self, now: f64, timeout: Duration) -> usize {
        let cutoff = now - timeout.as_secs_f64();
        let before = self.histories.len();
        self.histories.retain(|_, history| history.last_timestamp >= cutoff);
        before - self.histories.len()
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Dscp, L3Family};

    fn record(packets: u64, bytes: u64) -> FlowRecord {
        FlowRecord {
            key: FlowKey {
                layer3: L3Family::Ipv4,
                protocol: "tcp".to_string(),
                src: "10.0.0.2".parse().unwrap(),
                src_port: Some(40000),
                dst: "1.1.1.1".parse().unwrap(),
                dst_port: Some(443),
            },
            bytes,
            packets,
            dscp: Dscp::default(),
        }
    }

    #[test]
    fn first_sight_is_a_baseline() {
        let mut store = HistoryStore::default();
        let rate = store.update(&record(500, 50_000), 100.0);
        assert_eq!(rate, RateSample::default());
        let history = store.get(&record(0, 0).key).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.last_seen(), 100.0);
    }

    #[test]
    fn rate_is_delta_over_time() {
        let mut store = HistoryStore::default();
        store.update(&record(0, 0), 10.0);
        let rate = store.update(&record(100, 10_000), 12.0);
        assert_eq!(rate, RateSample { pps: 50, bps: 5_000 });
    }

    #[test]
    fn rates_are_rounded() {
        let mut store = HistoryStore::default();
        store.update(&record(0, 0), 0.0);
        let rate = store.update(&record(10, 7), 3.0);
        // 3.33 and 2.33
        assert_eq!(rate, RateSample { pps: 3, bps: 2 });
        let rate = store.update(&record(15, 12), 5.0);
        // 2.5 rounds away from zero
        assert_eq!(rate, RateSample { pps: 3, bps: 3 });
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let mut store = HistoryStore::default();
        store.update(&record(0, 0), 1.0);
        store.update(&record(1000, 100_000), 2.0);
        let rate = store.update(&record(10, 500), 3.0);
        assert_eq!(rate, RateSample::default());
        // The new counters become the baseline
        let rate = store.update(&record(20, 1500), 4.0);
        assert_eq!(rate, RateSample { pps: 10, bps: 1000 });
    }

    #[test]
    fn non_positive_interval_repeats_previous_rate() {
        let mut store = HistoryStore::default();
        store.update(&record(0, 0), 1.0);
        store.update(&record(100, 1000), 2.0);
        let same_time = store.update(&record(300, 3000), 2.0);
        assert_eq!(same_time, RateSample { pps: 100, bps: 1000 });
        let backwards = store.update(&record(400, 4000), 1.5);
        assert_eq!(backwards, RateSample { pps: 100, bps: 1000 });
        assert_eq!(store.get(&record(0, 0).key).unwrap().len(), 1);
    }

    #[test]
    fn non_positive_interval_before_any_rate_is_zero() {
        let mut store = HistoryStore::default();
        store.update(&record(0, 0), 5.0);
        let rate = store.update(&record(100, 100), 5.0);
        assert_eq!(rate, RateSample::default());
        assert!(store.get(&record(0, 0).key).unwrap().is_empty());
    }

    #[test]
    fn window_is_bounded_fifo() {
        let mut store = HistoryStore::new(3);
        store.update(&record(0, 0), 0.0);
        for i in 1..=5u64 {
            store.update(&record(i * i * 10, 0), i as f64);
        }
        let history = store.get(&record(0, 0).key).unwrap();
        assert_eq!(history.len(), 3);
        let pps: Vec<u64> = history.samples().map(|s| s.pps).collect();
        // deltas were 10, 30, 50, 70, 90
        assert_eq!(pps, vec![50, 70, 90]);
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(HistoryStore::new(0).capacity(), 1);
    }

    #[test]
    fn expire_drops_idle_flows() {
        let mut store = HistoryStore::default();
        let mut other = record(0, 0);
        other.key.dst_port = Some(80);
        store.update(&record(0, 0), 100.0);
        store.update(&other, 150.0);
        assert_eq!(store.expire(170.0, Duration::from_secs(60)), 0);
        assert_eq!(store.expire(170.0, Duration::from_secs(30)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&other.key).is_some());
    }
}
