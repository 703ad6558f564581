use crate::top_level_ui::InputMode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

fn keyhelp(key: &'static str, action: &'static str, buf: &mut Vec<Span<'static>>) {
    buf.push(Span::styled("[", Style::default().fg(Color::Green)));
    buf.push(Span::styled(key, Style::default().fg(Color::Green)));
    buf.push(Span::styled("] ", Style::default().fg(Color::Green)));
    buf.push(Span::styled(action, Style::default().fg(Color::Yellow)));
    buf.push(Span::styled(" ", Style::default().fg(Color::Green)));
}

pub fn help_line(mode: InputMode) -> impl Widget {
    let mut span_buf = vec![Span::styled("QMTOP - ", Style::default().fg(Color::White))];
    match mode {
        InputMode::Normal => {
            keyhelp("q", "Quit", &mut span_buf);
            keyhelp("/", "Filter", &mut span_buf);
            keyhelp("c", "Clear filter", &mut span_buf);
            keyhelp("1-9", "Sort by column (again to reverse)", &mut span_buf);
        }
        InputMode::EditingFilter => {
            keyhelp("Enter", "Done", &mut span_buf);
            keyhelp("Esc", "Done", &mut span_buf);
            keyhelp("Backspace", "Delete", &mut span_buf);
        }
    }
    Block::new().borders(Borders::NONE).title(span_buf)
}
