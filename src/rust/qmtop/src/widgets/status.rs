use crate::top_level_ui::InputMode;
use qosmate_flows::{FlowSnapshot, Presenter};
use qosmate_utils::packet_scale::{format_kbits, scale_packets};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

/// Summary line above the flow table: flow counts, aggregate rates, the
/// active filter and the last poll error, if any.
pub fn status_line(
    snapshot: &FlowSnapshot,
    presenter: &Presenter,
    shown: usize,
    mode: InputMode,
) -> impl Widget {
    let total_pps: u64 = snapshot.flows.iter().map(|f| f.instant_pps).sum();
    let total_bps: u64 = snapshot.flows.iter().map(|f| f.instant_bps).sum();

    let mut span_buf = vec![
        Span::styled(" [ Flows: ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("{shown}/{} ", snapshot.flows.len()),
            Style::default().fg(Color::White),
        ),
        Span::styled("Rate: ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("{} {} ", scale_packets(total_pps), format_kbits(total_bps)),
            Style::default().fg(Color::White),
        ),
        Span::styled("Filter: ", Style::default().fg(Color::Green)),
    ];

    let filter_style = match mode {
        InputMode::EditingFilter => Style::default().fg(Color::Black).bg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::Yellow),
    };
    span_buf.push(Span::styled(format!("{} ", presenter.filter()), filter_style));
    span_buf.push(Span::styled("] ", Style::default().fg(Color::Green)));

    if let Some(error) = &snapshot.last_error {
        span_buf.push(Span::styled(
            format!("Poll failed ({} so far): {error}", snapshot.failures),
            Style::default().fg(Color::Red),
        ));
    }

    Block::new().borders(Borders::NONE).title(span_buf)
}

#[cfg(test)]
mod test {
    use super::*;
    use qosmate_flows::{Dscp, EnrichedFlow, FlowKey, FlowRecord, L3Family};
    use ratatui::buffer::Buffer;
    use std::sync::Arc;

    fn line_text(widget: impl Widget) -> String {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn flow(instant_pps: u64, instant_bps: u64) -> EnrichedFlow {
        EnrichedFlow {
            record: FlowRecord {
                key: FlowKey {
                    layer3: L3Family::Ipv4,
                    protocol: "tcp".to_string(),
                    src: "10.0.0.2".parse().unwrap(),
                    src_port: Some(40000),
                    dst: "10.0.0.1".parse().unwrap(),
                    dst_port: Some(443),
                },
                bytes: 0,
                packets: 0,
                dscp: Dscp::default(),
            },
            instant_pps,
            instant_bps,
            avg_pps: 0,
            max_pps: 0,
            avg_bps: 0,
        }
    }

    #[test]
    fn rate_unit_appears_once() {
        let line = line_text(status_line(
            &FlowSnapshot::default(),
            &Presenter::default(),
            0,
            InputMode::Normal,
        ));
        assert!(line.contains("Flows: 0/0"), "{line}");
        assert!(line.contains("Rate: 0 pps 0.00 Kbit/s"), "{line}");
        assert!(!line.contains("pps pps"), "{line}");
    }

    #[test]
    fn rates_are_summed_and_scaled() {
        let snapshot = FlowSnapshot {
            flows: Arc::new(vec![flow(1000, 500), flow(500, 500)]),
            ..Default::default()
        };
        let line = line_text(status_line(&snapshot, &Presenter::default(), 1, InputMode::Normal));
        assert!(line.contains("Flows: 1/2"), "{line}");
        assert!(line.contains("Rate: 1.50 kpps 8.00 Kbit/s"), "{line}");
    }

    #[test]
    fn poll_errors_are_shown() {
        let snapshot = FlowSnapshot {
            failures: 2,
            last_error: Some("ubus missing".to_string()),
            ..Default::default()
        };
        let line = line_text(status_line(&snapshot, &Presenter::default(), 0, InputMode::Normal));
        assert!(line.contains("Poll failed (2 so far): ubus missing"), "{line}");
    }
}
