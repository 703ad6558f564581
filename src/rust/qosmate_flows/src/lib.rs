//! Flow-rate aggregation for the QoSmate connection view.
//!
//! Each poll delivers a full snapshot of the connection-tracking table
//! with *cumulative* byte and packet counters. The [`FlowEngine`] keeps a
//! short bounded history per flow, turns counter deltas into
//! instantaneous rates, and summarizes them into windowed averages and
//! peaks. The [`Presenter`] filters and sorts the result for display, and
//! the [`Poller`] drives the whole cycle on a fixed interval.

mod dscp;
mod engine;
mod error;
mod flow_key;
mod history;
mod poller;
mod presenter;
mod rate;
pub mod source;

pub use dscp::Dscp;
pub use engine::{EnrichedFlow, FlowEngine};
pub use error::FlowError;
pub use flow_key::{FlowKey, FlowRecord, L3Family};
pub use history::{FlowHistory, HistoryStore, RateSample, DEFAULT_HISTORY_LENGTH};
pub use poller::{spawn_poller, FlowSnapshot, Poller, PollerHandle};
pub use presenter::{render, FlowRow, Presenter, SortColumn, PORT_PLACEHOLDER};
pub use rate::{summarize, RateSummary};
