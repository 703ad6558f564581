use ratatui::{
    style::{Color, Style},
    text::Text,
    widgets::{Block, Borders, Cell, Row, Table},
};

/// A helper for building Ratatui tables
pub struct TableHelper<const N_COLS: usize> {
    headers: [String; N_COLS],
    rows: Vec<[String; N_COLS]>,
}

impl<const N: usize> TableHelper<N> {
    pub fn new<S: ToString>(raw_headers: [S; N]) -> Self {
        Self {
            headers: std::array::from_fn(|i| raw_headers[i].to_string()),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: [String; N]) {
        self.rows.push(row);
    }

    /// Each column is as wide as its widest cell, plus padding.
    fn widths(&self) -> [u16; N] {
        let mut widths = [0u16; N];
        for (i, heading) in self.headers.iter().enumerate() {
            widths[i] = (heading.chars().count() + 2) as u16;
        }
        for row in self.rows.iter() {
            for (j, cell) in row.iter().enumerate() {
                widths[j] = widths[j].max((cell.chars().count() + 2) as u16);
            }
        }
        widths
    }

    pub fn to_table(&self) -> Table {
        let header_cells: Vec<_> = self
            .headers
            .iter()
            .map(|h| Cell::from(Text::from(h.clone())))
            .collect();

        let rows: Vec<_> = self
            .rows
            .iter()
            .map(|row| Row::new(row.iter().map(|cell| Cell::from(Text::from(cell.clone())))))
            .collect();

        Table::new(rows, self.widths())
            .header(Row::new(header_cells).style(Style::default().fg(Color::White).bg(Color::Blue)))
    }

    pub fn to_block(&self) -> Table {
        let block = Block::default()
            .borders(Borders::NONE)
            .style(Style::default().fg(Color::Green));
        self.to_table().block(block)
    }
}
