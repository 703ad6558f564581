use crate::FlowHistory;

/// Windowed view of a flow's recent throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateSummary {
    /// Mean packets per second over the window
    pub avg_pps: u64,
    /// Mean bytes per second over the window
    pub avg_bps: u64,
    /// Highest packets per second in the window, floored at zero
    pub max_pps: u64,
}

/// Summarizes the samples currently held for a flow. An empty window
/// summarizes to all zeroes.
pub fn summarize(history: &FlowHistory) -> RateSummary {
    let n = history.len();
    if n == 0 {
        return RateSummary::default();
    }

    let (pps_total, bps_total, max_pps) = history.samples().fold(
        (0u128, 0u128, 0u64),
        |(pps, bps, max), sample| {
            (
                pps + sample.pps as u128,
                bps + sample.bps as u128,
                u64::max(max, sample.pps),
            )
        },
    );

    RateSummary {
        avg_pps: (pps_total as f64 / n as f64).round() as u64,
        avg_bps: (bps_total as f64 / n as f64).round() as u64,
        max_pps,
    }
}
