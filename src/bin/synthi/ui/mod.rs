//! TUI for synthi
//!
//! One matrix at a time, with an info panel for the cell under the cursor
//! and the oscilloscope input below.

mod matrix;
mod spectrum;
mod waveform;

use std::{path::PathBuf, time::Duration};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::{info, warn};

use synthi_matrix::{
    blueprint::Source,
    dsp::Waveform,
    graph::{GraphController, ScopeFrame},
    MatrixKind, PinColor, Synthesizer,
};

use matrix::{render_info, render_matrix};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_scope;

/// Oscilloscope history length, also the FFT size
const VIS_BUFFER_SIZE: usize = 1024;

/// One semitone as a frequency ratio.
const SEMITONE: f32 = 1.059_463_1;

pub struct UiApp {
    synth: Synthesizer<GraphController>,
    scope_rx: Consumer<ScopeFrame>,
    scope: Vec<ScopeFrame>,
    spectrum: SpectrumAnalyzer,
    kind: MatrixKind,
    /// Cursor per matrix: audio, control.
    cursors: [(usize, usize); 2],
    color: PinColor,
    xy: bool,
    patch_path: PathBuf,
    status: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        synth: Synthesizer<GraphController>,
        scope_rx: Consumer<ScopeFrame>,
        sample_rate: f32,
        patch_path: PathBuf,
    ) -> Self {
        Self {
            synth,
            scope_rx,
            scope: vec![ScopeFrame::default(); VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            kind: MatrixKind::Audio,
            cursors: [(0, 0); 2],
            color: PinColor::default(),
            xy: false,
            patch_path,
            status: String::new(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if self.synth.poll_readiness() {
                self.status = "audio ready".into();
            }
            self.poll_scope();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn poll_scope(&mut self) {
        let mut received = false;
        while let Ok(frame) = self.scope_rx.pop() {
            self.scope.push(frame);
            received = true;
        }
        if received {
            if self.scope.len() > VIS_BUFFER_SIZE {
                let excess = self.scope.len() - VIS_BUFFER_SIZE;
                self.scope.drain(0..excess);
            }
            let trace: Vec<f32> = self.scope.iter().map(|f| f.y).collect();
            self.spectrum.update(&trace);
        }
    }

    fn cursor(&self) -> (usize, usize) {
        self.cursors[self.kind as usize]
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let mapping = self.synth.matrix(self.kind).mapping();
        let (rows, cols) = (mapping.rows, mapping.cols);
        let (row, col) = &mut self.cursors[self.kind as usize];
        *row = row.saturating_add_signed(d_row).min(rows.saturating_sub(1));
        *col = col.saturating_add_signed(d_col).min(cols.saturating_sub(1));
    }

    /// Oscillator whose output row is under the cursor.
    fn oscillator_at_cursor(&self) -> Option<usize> {
        let (row, _) = self.cursor();
        match self.synth.matrix(self.kind).mapping().source(row)? {
            Source::OscillatorChannel { osc, .. } => Some(*osc),
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Tab => {
                self.kind = match self.kind {
                    MatrixKind::Audio => MatrixKind::Control,
                    MatrixKind::Control => MatrixKind::Audio,
                };
            }
            KeyCode::Char(' ') => self.toggle_pin(),
            KeyCode::Char('c') => self.cycle_color(),
            KeyCode::Char('x') => self.xy = !self.xy,
            KeyCode::Char('s') => self.save_patch(),
            KeyCode::Char(c @ '1'..='4') => {
                let waveform = Waveform::ALL[c as usize - '1' as usize];
                self.toggle_level(waveform);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.shift_frequency(SEMITONE),
            KeyCode::Char('-') => self.shift_frequency(1.0 / SEMITONE),
            _ => {}
        }
    }

    fn toggle_pin(&mut self) {
        let (row, col) = self.cursor();
        let bay = self.synth.matrix(self.kind);
        let active = bay.connection(row, col).is_some() || bay.is_pending(row, col);
        self.status = match self.synth.toggle(self.kind, row, col, !active, Some(self.color)) {
            Ok(true) if active => "pin removed".into(),
            Ok(true) => "pin connected".into(),
            Ok(false) if self.synth.matrix(self.kind).is_pending(row, col) => {
                "queued until audio is ready".into()
            }
            Ok(false) => "pin could not be built".into(),
            Err(err) => err.to_string(),
        };
    }

    fn cycle_color(&mut self) {
        let (row, col) = self.cursor();
        match self.synth.matrix(self.kind).pin_color_at(row, col) {
            Some(current) => {
                self.color = current.next();
                self.synth.on_color_change(self.kind, row, col, self.color);
            }
            None => self.color = self.color.next(),
        }
        self.status = format!("{} pin", self.color.label());
    }

    fn toggle_level(&mut self, waveform: Waveform) {
        let Some(osc) = self.oscillator_at_cursor() else {
            return;
        };
        let level = self
            .synth
            .rack()
            .oscillator(osc)
            .map_or(0.0, |v| v.state().levels.get(waveform));
        let next = if level > 0.0 { 0.0 } else { 1.0 };
        if let Err(err) = self.synth.set_level(osc, waveform, next) {
            warn!(osc, %err, "could not set level");
        }
    }

    fn shift_frequency(&mut self, ratio: f32) {
        let Some(osc) = self.oscillator_at_cursor() else {
            return;
        };
        let current = self
            .synth
            .rack()
            .oscillator(osc)
            .map_or(synthi_matrix::synth::voice::DEFAULT_FREQUENCY, |v| v.state().frequency);
        if let Err(err) = self.synth.set_frequency(osc, current * ratio) {
            warn!(osc, %err, "could not set frequency");
        }
    }

    fn save_patch(&mut self) {
        let name = self
            .patch_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let patch = self.synth.snapshot(name);
        self.status = match patch.save(&self.patch_path) {
            Ok(()) => {
                info!(path = %self.patch_path.display(), "patch saved");
                format!("saved {}", self.patch_path.display())
            }
            Err(err) => err.to_string(),
        };
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(12),   // Matrix and info
                Constraint::Length(10), // Scope and spectrum
                Constraint::Length(1),  // Status
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(36)])
            .split(rows[0]);
        let bay = self.synth.matrix(self.kind);
        render_matrix(frame, top[0], bay, self.cursor());
        render_info(frame, top[1], &self.synth, self.kind, self.cursor(), self.color);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        render_scope(frame, bottom[0], &self.scope, self.xy);
        render_spectrum(frame, bottom[1], self.spectrum.data());

        frame.render_widget(Paragraph::new(format!(" {}", self.status)), rows[2]);

        let help = Paragraph::new(
            " [Arrows] Move  [Space] Pin  [C] Colour  [Tab] Matrix  [1-4] Levels  [+/-] Pitch  [X] XY  [S] Save  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
