//! Line-oriented output for scripts and terminals without a full-screen
//! view. Every poller update prints the whole (filtered, sorted) table.

use anyhow::Result;
use qosmate_config::Config;
use qosmate_flows::{FlowRow, FlowSnapshot, Presenter, SortColumn};
use std::io::Write;
use tokio::sync::watch;
use tracing::info;

pub async fn run(
    config: &Config,
    mut updates: watch::Receiver<FlowSnapshot>,
    json: bool,
    count: Option<u64>,
) -> Result<()> {
    let presenter = Presenter::from_config(&config.display);
    let mut printed = 0u64;
    loop {
        if count.is_some_and(|limit| printed >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    info!("Poller went away, stopping");
                    break;
                }
            }
        }
        let snapshot = updates.borrow_and_update().clone();
        let Some(text) = format_update(&presenter, &snapshot, json)? else {
            continue;
        };
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        printed += 1;
    }
    Ok(())
}

/// Text to print for one poller update. Failed polls print nothing here;
/// the poller has already logged them.
fn format_update(presenter: &Presenter, snapshot: &FlowSnapshot, json: bool) -> Result<Option<String>> {
    if snapshot.last_error.is_some() {
        return Ok(None);
    }
    let rows = presenter.render(&snapshot.flows);
    let text = if json {
        format!("{}\n", serde_json::to_string(&rows)?)
    } else {
        format_table(presenter, &rows)
    };
    Ok(Some(text))
}

/// Renders rows as left-aligned text columns under a header line, followed
/// by a blank separator line.
fn format_table(presenter: &Presenter, rows: &[FlowRow]) -> String {
    let headers = SortColumn::ALL.map(|c| format!("{}{}", c.title(), presenter.indicator(c)));
    let cells: Vec<[String; 9]> = rows.iter().map(FlowRow::cells).collect();

    let mut widths = headers.each_ref().map(|h| h.chars().count());
    for row in cells.iter() {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut text = String::new();
    for line in std::iter::once(&headers).chain(cells.iter()) {
        let padded: Vec<String> = line
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        text.push_str(padded.join("  ").trim_end());
        text.push('\n');
    }
    text.push('\n');
    text
}
