use super::{keep_valid, SnapshotSource};
use crate::{Dscp, FlowError, FlowKey, FlowRecord, L3Family};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Reads the kernel connection-tracking table from procfs.
///
/// Byte and packet counters are only present when conntrack accounting
/// is enabled (`net.netfilter.nf_conntrack_acct = 1`); entries without
/// them are skipped. The traffic-class marking is taken from the low six
/// bits of the connection mark.
#[derive(Debug, Clone)]
pub struct ConntrackSource {
    path: PathBuf,
    timeout: Duration,
}

impl ConntrackSource {
    pub fn new(path: &str, timeout: Duration) -> Self {
        Self {
            path: PathBuf::from(path),
            timeout,
        }
    }
}

impl SnapshotSource for ConntrackSource {
    async fn fetch(&self) -> Result<Vec<FlowRecord>, FlowError> {
        let text = tokio::time::timeout(self.timeout, tokio::fs::read_to_string(&self.path))
            .await
            .map_err(|_| FlowError::Timeout(self.timeout))?
            .map_err(|e| FlowError::Fetch(format!("unable to read {}: {e}", self.path.display())))?;
        Ok(parse_nf_conntrack(&text))
    }
}

fn malformed(reason: &str) -> FlowError {
    FlowError::MalformedRecord(reason.to_string())
}

fn number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, FlowError> {
    value
        .parse()
        .map_err(|_| FlowError::MalformedRecord(format!("{name}={value} is not a number")))
}

/// Parses one `/proc/net/nf_conntrack` line, e.g.
///
/// ```text
/// ipv4 2 tcp 6 7440 ESTABLISHED src=10.0.0.2 dst=1.1.1.1 sport=40000 dport=443 packets=10 bytes=900 src=1.1.1.1 dst=10.0.0.2 sport=443 dport=40000 packets=8 bytes=4000 [ASSURED] mark=46 use=1
/// ```
///
/// Addresses and ports come from the original direction; counters are
/// summed over both directions.
fn parse_line(line: &str) -> Result<FlowRecord, FlowError> {
    let mut tokens = line.split_whitespace();
    let layer3: L3Family = tokens.next().ok_or_else(|| malformed("empty line"))?.parse()?;
    let _family_number = tokens.next();
    let protocol = tokens
        .next()
        .ok_or_else(|| malformed("missing protocol"))?
        .to_string();

    let mut src: Option<IpAddr> = None;
    let mut dst: Option<IpAddr> = None;
    let mut src_port: Option<u16> = None;
    let mut dst_port: Option<u16> = None;
    let mut packets: Option<u64> = None;
    let mut bytes: Option<u64> = None;
    let mut mark = 0u64;

    for token in tokens {
        let Some((name, value)) = token.split_once('=') else {
            continue;
        };
        match name {
            "src" if src.is_none() => {
                src = Some(value.parse().map_err(|_| malformed("bad src address"))?)
            }
            "dst" if dst.is_none() => {
                dst = Some(value.parse().map_err(|_| malformed("bad dst address"))?)
            }
            "sport" if src_port.is_none() => src_port = Some(number(name, value)?),
            "dport" if dst_port.is_none() => dst_port = Some(number(name, value)?),
            "packets" => packets = Some(packets.unwrap_or(0).saturating_add(number(name, value)?)),
            "bytes" => bytes = Some(bytes.unwrap_or(0).saturating_add(number(name, value)?)),
            "mark" => mark = number(name, value)?,
            _ => {}
        }
    }

    Ok(FlowRecord {
        key: FlowKey {
            layer3,
            protocol,
            src: src.ok_or_else(|| malformed("missing src"))?,
            src_port,
            dst: dst.ok_or_else(|| malformed("missing dst"))?,
            dst_port,
        },
        bytes: bytes.ok_or_else(|| malformed("no byte counter (is nf_conntrack_acct enabled?)"))?,
        packets: packets.ok_or_else(|| malformed("no packet counter"))?,
        dscp: Dscp::from_mark(mark),
    })
}

/// Parses the whole table, skipping lines that cannot be used.
pub fn parse_nf_conntrack(text: &str) -> Vec<FlowRecord> {
    keep_valid(
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| (format!("line {}", idx + 1), parse_line(line))),
    )
}
