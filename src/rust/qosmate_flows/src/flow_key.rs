use crate::{presenter::PORT_PLACEHOLDER, Dscp, FlowError};
use std::{fmt, net::IpAddr, str::FromStr};

/// Network-layer family of a tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L3Family {
    Ipv4,
    Ipv6,
}

impl FromStr for L3Family {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            other => Err(FlowError::MalformedRecord(format!(
                "unknown layer3 family [{other}]"
            ))),
        }
    }
}

impl fmt::Display for L3Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// Stable identity of a flow across polls: the immutable 6-tuple of the
/// conntrack entry. Ports are absent for protocols that do not carry them
/// (ICMP, GRE, ...), and that absence is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub layer3: L3Family,
    /// Transport protocol name as reported by conntrack, e.g. `tcp`
    pub protocol: String,
    pub src: IpAddr,
    pub src_port: Option<u16>,
    pub dst: IpAddr,
    pub dst_port: Option<u16>,
}

impl FlowKey {
    /// `address:port`, with a placeholder for a missing port.
    pub fn source_endpoint(&self) -> String {
        endpoint(&self.src, self.src_port)
    }

    /// `address:port`, with a placeholder for a missing port.
    pub fn destination_endpoint(&self) -> String {
        endpoint(&self.dst, self.dst_port)
    }
}

fn endpoint(ip: &IpAddr, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{ip}:{port}"),
        None => format!("{ip}:{PORT_PLACEHOLDER}"),
    }
}

/// One poll's view of a single flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub key: FlowKey,
    /// Cumulative bytes since conntrack created the entry
    pub bytes: u64,
    /// Cumulative packets since conntrack created the entry
    pub packets: u64,
    pub dscp: Dscp,
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn key(src_port: Option<u16>) -> FlowKey {
        FlowKey {
            layer3: L3Family::Ipv4,
            protocol: "udp".to_string(),
            src: "192.168.1.10".parse().unwrap(),
            src_port,
            dst: "9.9.9.9".parse().unwrap(),
            dst_port: Some(53),
        }
    }

    #[test]
    fn absent_port_is_a_distinct_identity() {
        let mut keys = HashSet::new();
        keys.insert(key(None));
        keys.insert(key(Some(0)));
        keys.insert(key(None));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn endpoints_render_placeholder() {
        assert_eq!(key(None).source_endpoint(), "192.168.1.10:-");
        assert_eq!(key(Some(5353)).source_endpoint(), "192.168.1.10:5353");
        assert_eq!(key(None).destination_endpoint(), "9.9.9.9:53");
    }

    #[test]
    fn layer3_parsing() {
        assert_eq!("IPv6".parse::<L3Family>().unwrap(), L3Family::Ipv6);
        assert!(matches!(
            "ipx".parse::<L3Family>(),
            Err(FlowError::MalformedRecord(_))
        ));
    }
}
