//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use synthi_matrix::graph::ScopeFrame;

/// Render the scope inputs, either Y against time or Y against X.
pub fn render_scope(frame: &mut Frame, area: Rect, frames: &[ScopeFrame], xy: bool) {
    let title = if xy { " Scope X/Y " } else { " Scope " };
    let block = Block::default().title(title).borders(Borders::ALL);

    let data: Vec<(f64, f64)> = if xy {
        frames.iter().map(|f| (f.x as f64, f.y as f64)).collect()
    } else {
        frames
            .iter()
            .enumerate()
            .map(|(i, f)| (i as f64 / frames.len() as f64, f.y as f64))
            .collect()
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(if xy {
            GraphType::Scatter
        } else {
            GraphType::Line
        })
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let x_bounds = if xy { [-1.0, 1.0] } else { [0.0, 1.0] };
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(x_bounds)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
