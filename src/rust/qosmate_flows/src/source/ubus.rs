use super::{keep_valid, SnapshotSource};
use crate::{Dscp, FlowError, FlowKey, FlowRecord, L3Family};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;

/// Fetches the flow table from the QoSmate RPC daemon, equivalent to
/// `ubus call luci.qosmate getConntrackDSCP`.
#[derive(Debug, Clone)]
pub struct UbusSource {
    object: String,
    method: String,
    timeout: Duration,
}

impl UbusSource {
    pub fn new(object: &str, method: &str, timeout: Duration) -> Self {
        Self {
            object: object.to_string(),
            method: method.to_string(),
            timeout,
        }
    }
}

impl SnapshotSource for UbusSource {
    async fn fetch(&self) -> Result<Vec<FlowRecord>, FlowError> {
        let call = Command::new("ubus")
            .arg("call")
            .arg(&self.object)
            .arg(&self.method)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| FlowError::Timeout(self.timeout))?
            .map_err(|e| FlowError::Fetch(format!("unable to run ubus: {e}")))?;
        if !output.status.success() {
            return Err(FlowError::Fetch(format!(
                "ubus call {} {} failed ({}): {}",
                self.object,
                self.method,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_ubus_reply(&output.stdout)
    }
}

#[derive(Deserialize)]
struct ConntrackReply {
    connections: Connections,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Connections {
    Keyed(serde_json::Map<String, Value>),
    Listed(Vec<Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    fn to_u64(&self, field: &str) -> Result<u64, FlowError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|_| {
                FlowError::MalformedRecord(format!("{field} [{s}] is not a number"))
            }),
        }
    }
}

#[derive(Deserialize)]
struct RawConnection {
    layer3: Option<String>,
    protocol: Option<String>,
    src: Option<String>,
    sport: Option<NumberOrText>,
    dst: Option<String>,
    dport: Option<NumberOrText>,
    bytes: Option<NumberOrText>,
    packets: Option<NumberOrText>,
    dscp: Option<NumberOrText>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, FlowError> {
    value.ok_or_else(|| FlowError::MalformedRecord(format!("missing {field}")))
}

/// Port zero means the helper had no port for this protocol.
fn port(value: Option<NumberOrText>, field: &str) -> Result<Option<u16>, FlowError> {
    match value {
        None => Ok(None),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => match v.to_u64(field)? {
            0 => Ok(None),
            n => u16::try_from(n)
                .map(Some)
                .map_err(|_| FlowError::MalformedRecord(format!("{field} {n} is out of range"))),
        },
    }
}

fn address(value: Option<String>, field: &str) -> Result<std::net::IpAddr, FlowError> {
    let raw = required(value, field)?;
    raw.trim()
        .parse()
        .map_err(|_| FlowError::MalformedRecord(format!("{field} [{raw}] is not an IP address")))
}

impl TryFrom<RawConnection> for FlowRecord {
    type Error = FlowError;

    fn try_from(raw: RawConnection) -> Result<Self, Self::Error> {
        let layer3: L3Family = required(raw.layer3, "layer3")?.parse()?;
        let protocol = required(raw.protocol, "protocol")?;
        if protocol.trim().is_empty() {
            return Err(FlowError::MalformedRecord("empty protocol".to_string()));
        }
        Ok(FlowRecord {
            key: FlowKey {
                layer3,
                protocol,
                src: address(raw.src, "src")?,
                src_port: port(raw.sport, "sport")?,
                dst: address(raw.dst, "dst")?,
                dst_port: port(raw.dport, "dport")?,
            },
            bytes: required(raw.bytes, "bytes")?.to_u64("bytes")?,
            packets: required(raw.packets, "packets")?.to_u64("packets")?,
            dscp: Dscp::from_mark(required(raw.dscp, "dscp")?.to_u64("dscp")?),
        })
    }
}

fn parse_connection(value: Value) -> Result<FlowRecord, FlowError> {
    let raw: RawConnection = serde_json::from_value(value)
        .map_err(|e| FlowError::MalformedRecord(e.to_string()))?;
    FlowRecord::try_from(raw)
}

/// Decodes the `getConntrackDSCP` reply. The reply must contain a
/// `connections` member (an object keyed by connection id, or an array);
/// individual unusable records are skipped.
pub fn parse_ubus_reply(raw: &[u8]) -> Result<Vec<FlowRecord>, FlowError> {
    let reply: ConntrackReply = serde_json::from_slice(raw)?;
    let results: Vec<(String, Result<FlowRecord, FlowError>)> = match reply.connections {
        Connections::Keyed(map) => map
            .into_iter()
            .map(|(id, value)| (id, parse_connection(value)))
            .collect(),
        Connections::Listed(list) => list
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (idx.to_string(), parse_connection(value)))
            .collect(),
    };
    Ok(keep_valid(results))
}
