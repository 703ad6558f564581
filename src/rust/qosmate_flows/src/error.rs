use qosmate_utils::unix_time::TimeError;
use std::time::Duration;
use thiserror::Error;

/// Failures the aggregation pipeline can encounter. None of them are
/// fatal: the poller logs them and carries on with the next tick.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The transport could not deliver a snapshot.
    #[error("Unable to fetch the flow table: {0}")]
    Fetch(String),

    /// The transport did not answer within its timeout.
    #[error("Flow table fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The snapshot as a whole could not be decoded.
    #[error("Malformed flow table payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A single flow record was unusable. The rest of the snapshot is kept.
    #[error("Malformed flow record: {0}")]
    MalformedRecord(String),

    #[error("Unable to read the clock: {0}")]
    Clock(#[from] TimeError),
}
