//! Where flow-table snapshots come from.
//!
//! You can select one by adding a `[source]` section to your configuration file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Ask the QoSmate RPC daemon through `ubus call`
    Ubus,
    /// Read the kernel connection-tracking table directly
    Conntrack,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub ubus_object: String,
    pub ubus_method: String,
    pub conntrack_path: String,
    /// Transport timeout for a single fetch
    pub fetch_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Ubus,
            ubus_object: "luci.qosmate".to_string(),
            ubus_method: "getConntrackDSCP".to_string(),
            conntrack_path: "/proc/net/nf_conntrack".to_string(),
            fetch_timeout_ms: 5000,
        }
    }
}
