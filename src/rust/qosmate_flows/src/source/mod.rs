//! Snapshot sources. A source delivers the complete flow table each time
//! it is asked; it knows nothing about rates or display.

mod conntrack;
mod ubus;

pub use conntrack::{parse_nf_conntrack, ConntrackSource};
pub use ubus::{parse_ubus_reply, UbusSource};

use crate::{FlowError, FlowRecord};
use qosmate_config::{Config, SourceKind};
use std::future::Future;
use tracing::{debug, warn};

/// Something that can produce a full flow-table snapshot.
///
/// Implementations own their transport timeout. Records that cannot be
/// decoded are dropped (and logged) without failing the whole fetch.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<FlowRecord>, FlowError>> + Send;
}

/// The source selected by the configuration file.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    Ubus(UbusSource),
    Conntrack(ConntrackSource),
}

impl ConfiguredSource {
    pub fn from_config(config: &Config) -> Self {
        match config.source.kind {
            SourceKind::Ubus => Self::Ubus(UbusSource::new(
                &config.source.ubus_object,
                &config.source.ubus_method,
                config.fetch_timeout(),
            )),
            SourceKind::Conntrack => Self::Conntrack(ConntrackSource::new(
                &config.source.conntrack_path,
                config.fetch_timeout(),
            )),
        }
    }
}

impl SnapshotSource for ConfiguredSource {
    async fn fetch(&self) -> Result<Vec<FlowRecord>, FlowError> {
        match self {
            Self::Ubus(source) => source.fetch().await,
            Self::Conntrack(source) => source.fetch().await,
        }
    }
}

/// Collects per-record parse results, keeping the good ones and logging
/// the rest.
fn keep_valid<I>(results: I) -> Vec<FlowRecord>
where
    I: IntoIterator<Item = (String, Result<FlowRecord, FlowError>)>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut first_reason = None;
    for (id, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("Skipping flow record {id}: {e}");
                skipped += 1;
                if first_reason.is_none() {
                    first_reason = Some(format!("{id}: {e}"));
                }
            }
        }
    }
    if let Some(reason) = first_reason {
        warn!("Skipped {skipped} malformed flow records (first was {reason})");
    }
    records
}
