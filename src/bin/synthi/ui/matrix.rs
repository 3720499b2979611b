//! Pin grid and cell info widgets

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use synthi_matrix::{
    blueprint::Source, graph::GraphController, MatrixKind, PatchBay, PinColor, Synthesizer,
};

/// Width of the row label gutter.
const GUTTER: u16 = 5;
/// Characters per cell.
const CELL: u16 = 2;

fn pin_style(color: PinColor) -> Style {
    let fg = match color {
        PinColor::White => Color::White,
        PinColor::Grey => Color::Gray,
        PinColor::Green => Color::Green,
        PinColor::Red => Color::Red,
    };
    Style::default().fg(fg)
}

/// First index of a `visible`-wide window over `total` that keeps `cursor` in view.
fn window_start(cursor: usize, visible: usize, total: usize) -> usize {
    if visible >= total {
        return 0;
    }
    cursor.saturating_sub(visible / 2).min(total - visible)
}

pub fn render_matrix(frame: &mut Frame, area: Rect, bay: &PatchBay, cursor: (usize, usize)) {
    let block = Block::default()
        .title(format!(" {} ", bay.kind().label()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mapping = bay.mapping();
    let visible_cols = (inner.width.saturating_sub(GUTTER) / CELL) as usize;
    let visible_rows = inner.height.saturating_sub(1) as usize;
    let col_start = window_start(cursor.1, visible_cols, mapping.cols);
    let row_start = window_start(cursor.0, visible_rows, mapping.rows);
    let cols = col_start..(col_start + visible_cols).min(mapping.cols);
    let rows = row_start..(row_start + visible_rows).min(mapping.rows);

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::with_capacity(rows.len() + 1);

    // Column numbers, last digit only
    let mut header = vec![Span::styled(" ".repeat(GUTTER as usize), label)];
    for col in cols.clone() {
        let (_, number) = mapping.canonical(0, col);
        let style = if col == cursor.1 {
            label.fg(Color::Yellow)
        } else {
            label
        };
        header.push(Span::styled(format!("{:<2}", number % 10), style));
    }
    lines.push(Line::from(header));

    for row in rows {
        let (number, _) = mapping.canonical(row, 0);
        let style = if row == cursor.0 {
            label.fg(Color::Yellow)
        } else {
            label
        };
        let mut spans = vec![Span::styled(format!("{:>4} ", number), style)];

        for col in cols.clone() {
            let (glyph, mut style) = if let Some(connection) = bay.connection(row, col) {
                ("●", pin_style(connection.color))
            } else if bay.is_pending(row, col) {
                ("◌", Style::default().fg(Color::Yellow))
            } else if mapping.endpoints(row, col).is_some() {
                ("·", Style::default().fg(Color::DarkGray))
            } else {
                (" ", Style::default())
            };
            if (row, col) == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(glyph, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_info(
    frame: &mut Frame,
    area: Rect,
    synth: &Synthesizer<GraphController>,
    kind: MatrixKind,
    cursor: (usize, usize),
    color: PinColor,
) {
    let block = Block::default().title(" Pin ").borders(Borders::ALL);
    let bay = synth.matrix(kind);
    let mapping = bay.mapping();
    let (row, col) = cursor;
    let (canonical_row, canonical_col) = mapping.canonical(row, col);

    let source = mapping
        .source(row)
        .map_or_else(|| "-".to_string(), Source::label);
    let destination = mapping
        .destination(col)
        .map_or_else(|| "-".to_string(), |d| d.kind.label());

    let waiting = if synth.rack().is_ready() {
        ""
    } else {
        "  (waiting for audio)"
    };
    let mut lines = vec![
        Line::from(format!("{}{waiting}", bay.blueprint().name)),
        Line::from(format!("row {canonical_row:>3}  {source}")),
        Line::from(format!("col {canonical_col:>3}  {destination}")),
        Line::from(""),
    ];

    let shown = bay.pin_color_at(row, col).unwrap_or(color);
    match synth.pin_gain(kind, row, col, Some(shown)) {
        Some(gain) => {
            let state = if bay.connection(row, col).is_some() {
                "live"
            } else if bay.is_pending(row, col) {
                "pending"
            } else {
                "open"
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<6}", shown.label()), pin_style(shown)),
                Span::raw(format!(" gain {gain:.3}  {state}")),
            ]));
        }
        None => lines.push(Line::from("no connection here")),
    }
    lines.push(Line::from(format!("{} pins on this panel", bay.connection_count())));

    if let Some(Source::OscillatorChannel { osc, .. }) = mapping.source(row) {
        lines.push(Line::from(""));
        match synth.rack().oscillator(*osc) {
            Some(voice) => {
                let state = voice.state();
                lines.push(Line::from(format!(
                    "OSC {}  {:.2} Hz{}",
                    osc + 1,
                    state.frequency,
                    if voice.is_dormant() { "  zz" } else { "" }
                )));
                lines.push(Line::from(format!(
                    "sin {:.1} saw {:.1} tri {:.1} pul {:.1}",
                    state.levels.sine, state.levels.saw, state.levels.tri, state.levels.pulse
                )));
            }
            None => lines.push(Line::from(format!("OSC {}  untouched", osc + 1))),
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
