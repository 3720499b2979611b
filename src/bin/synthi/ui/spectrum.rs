//! Spectrum of the scope's Y input
//!
//! Hann-windowed FFT read out at log-spaced frequencies, with a slow decay
//! so transients stay visible for a few frames.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
/// dB lost per update when the level drops.
const DECAY_DB: f64 = 3.0;
const LOWEST_HZ: f32 = 20.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// (band frequency, FFT bin)
    bands: Vec<(f64, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (frequency_hz, magnitude_db)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let denom = (size - 1) as f32;
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let top = (sample_rate / 2.0).clamp(LOWEST_HZ + 1.0, 20_000.0) as f64;
        let bottom = LOWEST_HZ as f64;
        let last_bin = size / 2 - 1;
        let bands: Vec<(f64, usize)> = (0..BANDS)
            .map(|i| {
                let t = i as f64 / (BANDS - 1) as f64;
                let freq = bottom * (top / bottom).powf(t);
                let bin = (freq * size as f64 / sample_rate as f64).round() as usize;
                (freq, bin.min(last_bin))
            })
            .collect();

        Self {
            window,
            spectrum: bands.iter().map(|&(f, _)| (f, FLOOR_DB)).collect(),
            bands,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Analyse one buffer. Buffers of the wrong length are ignored.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (point, &(_, index)) in self.spectrum.iter_mut().zip(&self.bands) {
            let power = self.scratch[index].norm_sqr().max(1e-12) as f64;
            let db = (10.0 * power.log10()).max(FLOOR_DB);
            point.1 = db.max(point.1 - DECAY_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    // Plot against log frequency so the bands are evenly spaced
    let data: Vec<(f64, f64)> = spectrum.iter().map(|&(f, db)| (f.log10(), db)).collect();
    let (low, high) = data
        .first()
        .zip(data.last())
        .map_or((0.0, 1.0), |(a, b)| (a.0, b.0.max(a.0 + 1.0)));
    let peak = data.iter().map(|p| p.1).fold(FLOOR_DB, f64::max);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, peak.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
