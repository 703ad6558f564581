//! Filtering and sorting of enriched flows for display. The presenter
//! only remembers the user's filter and sort choices; the flows are
//! passed in on every call.

use crate::EnrichedFlow;
use qosmate_config::DisplayConfig;
use qosmate_utils::packet_scale::{format_kbits, format_size};
use serde::Serialize;
use std::str::FromStr;
use tracing::warn;

/// Rendered in place of a port for protocols without one.
pub const PORT_PLACEHOLDER: &str = "-";

/// Sortable columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Protocol,
    Source,
    Destination,
    Dscp,
    Bytes,
    Packets,
    AvgPps,
    MaxPps,
    AvgBps,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Text(String),
    Number(u64),
}

impl SortColumn {
    pub const ALL: [SortColumn; 9] = [
        Self::Protocol,
        Self::Source,
        Self::Destination,
        Self::Dscp,
        Self::Bytes,
        Self::Packets,
        Self::AvgPps,
        Self::MaxPps,
        Self::AvgBps,
    ];

    /// Name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Source => "src",
            Self::Destination => "dst",
            Self::Dscp => "dscp",
            Self::Bytes => "bytes",
            Self::Packets => "packets",
            Self::AvgPps => "avgPps",
            Self::MaxPps => "maxPps",
            Self::AvgBps => "avgBps",
        }
    }

    /// Column heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Protocol => "Protocol",
            Self::Source => "Source",
            Self::Destination => "Destination",
            Self::Dscp => "DSCP",
            Self::Bytes => "Bytes",
            Self::Packets => "Packets",
            Self::AvgPps => "Avg PPS",
            Self::MaxPps => "Max PPS",
            Self::AvgBps => "Avg BPS",
        }
    }

    fn sort_key(&self, flow: &EnrichedFlow) -> SortKey {
        let key = &flow.record.key;
        match self {
            Self::Protocol => SortKey::Text(key.protocol.to_lowercase()),
            Self::Source => SortKey::Text(key.src.to_string().to_lowercase()),
            Self::Destination => SortKey::Text(key.dst.to_string().to_lowercase()),
            Self::Dscp => SortKey::Number(flow.record.dscp.value() as u64),
            Self::Bytes => SortKey::Number(flow.record.bytes),
            Self::Packets => SortKey::Number(flow.record.packets),
            Self::AvgPps => SortKey::Number(flow.avg_pps),
            Self::MaxPps => SortKey::Number(flow.max_pps),
            Self::AvgBps => SortKey::Number(flow.avg_bps),
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown sort column [{s}]"))
    }
}

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRow {
    pub protocol: String,
    pub source: String,
    pub destination: String,
    pub dscp: String,
    pub bytes: String,
    pub packets: u64,
    pub avg_pps: u64,
    pub max_pps: u64,
    pub avg_bps: String,
}

impl FlowRow {
    fn new(flow: &EnrichedFlow) -> Self {
        let key = &flow.record.key;
        Self {
            protocol: key.protocol.to_uppercase(),
            source: key.source_endpoint(),
            destination: key.destination_endpoint(),
            dscp: flow.record.dscp.name().into_owned(),
            bytes: format_size(flow.record.bytes),
            packets: flow.record.packets,
            avg_pps: flow.avg_pps,
            max_pps: flow.max_pps,
            avg_bps: format_kbits(flow.avg_bps),
        }
    }

    /// Cells in [`SortColumn::ALL`] order.
    pub fn cells(&self) -> [String; 9] {
        [
            self.protocol.clone(),
            self.source.clone(),
            self.destination.clone(),
            self.dscp.clone(),
            self.bytes.clone(),
            self.packets.to_string(),
            self.avg_pps.to_string(),
            self.max_pps.to_string(),
            self.avg_bps.clone(),
        ]
    }
}

fn matches_filter(flow: &EnrichedFlow, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let key = &flow.record.key;
    key.protocol.to_lowercase().contains(needle)
        || key.source_endpoint().to_lowercase().contains(needle)
        || key.destination_endpoint().to_lowercase().contains(needle)
        || flow.record.dscp.name().to_lowercase().contains(needle)
}

/// Filters and sorts `flows` into display rows.
///
/// The filter is a case-insensitive substring match against the protocol,
/// `source:port`, `destination:port` and DSCP name. Descending order is
/// the exact reverse of ascending order, ties included.
pub fn render(
    flows: &[EnrichedFlow],
    filter: &str,
    column: SortColumn,
    descending: bool,
) -> Vec<FlowRow> {
    let needle = filter.to_lowercase();
    let mut selected: Vec<&EnrichedFlow> = flows
        .iter()
        .filter(|flow| matches_filter(flow, &needle))
        .collect();
    selected.sort_by_cached_key(|flow| column.sort_key(flow));
    if descending {
        selected.reverse();
    }
    selected.into_iter().map(FlowRow::new).collect()
}

/// Filter and sort state driven by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presenter {
    filter: String,
    column: SortColumn,
    descending: bool,
}

impl Default for Presenter {
    fn default() -> Self {
        Self {
            filter: String::new(),
            column: SortColumn::Bytes,
            descending: true,
        }
    }
}

impl Presenter {
    pub fn from_config(display: &DisplayConfig) -> Self {
        let column = display.sort_column.parse().unwrap_or_else(|e| {
            warn!("{e}, sorting by bytes");
            SortColumn::Bytes
        });
        Self {
            filter: display.filter.clone(),
            column,
            descending: display.sort_descending,
        }
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Selecting the active column flips the direction; selecting a
    /// different column sorts it descending.
    pub fn select_column(&mut self, column: SortColumn) {
        if self.column == column {
            self.descending = !self.descending;
        } else {
            self.column = column;
            self.descending = true;
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn column(&self) -> SortColumn {
        self.column
    }

    pub fn descending(&self) -> bool {
        self.descending
    }

    /// Arrow shown next to the active column heading.
    pub fn indicator(&self, column: SortColumn) -> &'static str {
        match (self.column == column, self.descending) {
            (false, _) => "",
            (true, true) => " ▼",
            (true, false) => " ▲",
        }
    }

    pub fn render(&self, flows: &[EnrichedFlow]) -> Vec<FlowRow> {
        render(flows, &self.filter, self.column, self.descending)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Dscp, FlowKey, FlowRecord, L3Family};

    fn flow(protocol: &str, src: &str, dport: Option<u16>, dscp: u64, bytes: u64) -> EnrichedFlow {
        EnrichedFlow {
            record: FlowRecord {
                key: FlowKey {
                    layer3: L3Family::Ipv4,
                    protocol: protocol.to_string(),
                    src: src.parse().unwrap(),
                    src_port: dport.map(|p| p + 30000),
                    dst: "198.51.100.1".parse().unwrap(),
                    dst_port: dport,
                },
                bytes,
                packets: bytes / 100,
                dscp: Dscp::from_mark(dscp),
            },
            instant_pps: 0,
            instant_bps: 0,
            avg_pps: bytes / 1000,
            max_pps: bytes / 500,
            avg_bps: bytes,
        }
    }

    fn sample() -> Vec<EnrichedFlow> {
        vec![
            flow("tcp", "192.168.1.2", Some(443), 46, 5000),
            flow("udp", "192.168.1.3", Some(3478), 46, 9000),
            flow("tcp", "192.168.1.4", Some(80), 0, 5000),
            flow("icmp", "192.168.1.5", None, 8, 100),
        ]
    }

    #[test]
    fn empty_filter_returns_everything() {
        assert_eq!(render(&sample(), "", SortColumn::Bytes, true).len(), 4);
    }

    #[test]
    fn filter_on_dscp_name_ignores_case() {
        let rows = render(&sample(), "ef", SortColumn::Bytes, true);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.dscp == "EF"));
        assert_eq!(render(&sample(), "EF", SortColumn::Bytes, true), rows);
    }

    #[test]
    fn filter_on_protocol_and_endpoints() {
        assert_eq!(render(&sample(), "UDP", SortColumn::Bytes, true).len(), 1);
        assert_eq!(render(&sample(), "192.168.1.4:", SortColumn::Bytes, true).len(), 1);
        assert_eq!(render(&sample(), ":443", SortColumn::Bytes, true).len(), 1);
        // The ICMP flow has no ports
        let rows = render(&sample(), ":-", SortColumn::Bytes, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].protocol, "ICMP");
        assert_eq!(rows[0].destination, "198.51.100.1:-");
    }

    #[test]
    fn toggling_reverses_exactly() {
        let flows = sample();
        let descending = render(&flows, "", SortColumn::Bytes, true);
        let mut ascending = render(&flows, "", SortColumn::Bytes, false);
        let bytes: Vec<_> = descending.iter().map(|r| r.bytes.clone()).collect();
        assert_eq!(bytes, vec!["8.79 KiB", "4.88 KiB", "4.88 KiB", "100 B"]);
        ascending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn numeric_columns_compare_as_numbers() {
        let flows = vec![
            flow("tcp", "10.0.0.1", Some(1), 0, 900),
            flow("tcp", "10.0.0.2", Some(1), 0, 10_000),
            flow("tcp", "10.0.0.3", Some(1), 0, 80),
        ];
        let rows = render(&flows, "", SortColumn::AvgBps, false);
        let sources: Vec<_> = rows.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["10.0.0.3:30001", "10.0.0.1:30001", "10.0.0.2:30001"]);
    }

    #[test]
    fn text_columns_ignore_case() {
        let flows = vec![
            flow("UDP", "10.0.0.1", Some(1), 0, 1),
            flow("icmp", "10.0.0.2", None, 0, 1),
            flow("Tcp", "10.0.0.3", Some(1), 0, 1),
        ];
        let rows = render(&flows, "", SortColumn::Protocol, false);
        let protocols: Vec<_> = rows.iter().map(|r| r.protocol.as_str()).collect();
        assert_eq!(protocols, vec!["ICMP", "TCP", "UDP"]);
    }

    #[test]
    fn dscp_sorts_by_value() {
        let rows = render(&sample(), "", SortColumn::Dscp, false);
        let names: Vec<_> = rows.iter().map(|r| r.dscp.as_str()).collect();
        assert_eq!(names, vec!["CS0", "CS1", "EF", "EF"]);
    }

    #[test]
    fn row_formatting() {
        let rows = render(&[flow("tcp", "192.168.1.2", Some(443), 46, 12_500)], "", SortColumn::Bytes, true);
        assert_eq!(
            rows[0].cells(),
            [
                "TCP".to_string(),
                "192.168.1.2:30443".to_string(),
                "198.51.100.1:443".to_string(),
                "EF".to_string(),
                "12.21 KiB".to_string(),
                "125".to_string(),
                "12".to_string(),
                "25".to_string(),
                "100.00 Kbit/s".to_string(),
            ]
        );
    }

    #[test]
    fn column_selection_toggles() {
        let mut presenter = Presenter::default();
        assert_eq!(presenter.column(), SortColumn::Bytes);
        assert!(presenter.descending());
        presenter.select_column(SortColumn::Bytes);
        assert!(!presenter.descending());
        assert_eq!(presenter.indicator(SortColumn::Bytes), " ▲");
        presenter.select_column(SortColumn::Protocol);
        assert_eq!(presenter.column(), SortColumn::Protocol);
        assert!(presenter.descending());
        assert_eq!(presenter.indicator(SortColumn::Bytes), "");
    }

    #[test]
    fn presenter_holds_no_flows() {
        let mut presenter = Presenter::default();
        presenter.set_filter("tcp");
        assert_eq!(presenter.render(&sample()).len(), 2);
        assert!(presenter.render(&[]).is_empty());
    }

    #[test]
    fn column_names_parse() {
        for column in SortColumn::ALL {
            assert_eq!(column.name().parse::<SortColumn>().unwrap(), column);
        }
        assert_eq!("AVGPPS".parse::<SortColumn>().unwrap(), SortColumn::AvgPps);
        assert!("colour".parse::<SortColumn>().is_err());
    }

    #[test]
    fn config_names_match_columns() {
        let names: Vec<_> = SortColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, qosmate_config::SORT_COLUMN_NAMES);
    }

    #[test]
    fn from_config_reads_display_section() {
        let display = DisplayConfig {
            sort_column: "maxPps".to_string(),
            sort_descending: false,
            filter: "udp".to_string(),
        };
        let presenter = Presenter::from_config(&display);
        assert_eq!(presenter.column(), SortColumn::MaxPps);
        assert!(!presenter.descending());
        assert_eq!(presenter.filter(), "udp");
    }
}
