//! Audio device setup and the control loop around it.

use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, warn};

use synthi_matrix::{
    graph::{GraphController, GraphLayout, SignalGraph},
    EngineConfig, Patch, Synthesizer, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// How long to wait for the first audio callback before starting the UI.
const READY_TIMEOUT: Duration = Duration::from_secs(2);

pub fn run(config: EngineConfig, patch_path: PathBuf) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;

    let layout = GraphLayout {
        input_amplifiers: config.voices.input_amplifiers,
        output_buses: config.voices.output_buses,
        ..GraphLayout::default()
    };
    let buses = layout.output_buses;
    let (graph, mut renderer, scope_rx) = SignalGraph::build(layout, sample_rate);
    info!(sample_rate, channels, buses, "audio device opened");

    // The renderer lives on the audio thread from here on
    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let wanted = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let frames = renderer.render_block(wanted);

                let out = &mut data[frames_written * channels..(frames_written + frames) * channels];
                out.fill(0.0);

                // Bus n plays on device channel n mod channels
                for bus in 0..buses {
                    let ch = bus % channels;
                    for (i, &sample) in renderer.bus_output(bus).iter().enumerate() {
                        out[i * channels + ch] += sample;
                    }
                }
                for sample in out.iter_mut() {
                    *sample = sample.clamp(-1.0, 1.0);
                }

                frames_written += frames;
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    let mut synth = Synthesizer::new(graph, config);
    wait_for_audio(&mut synth);

    if patch_path.exists() {
        let patch = Patch::load(&patch_path).wrap_err("failed to load patch")?;
        let pins = synth.load_patch(&patch);
        info!(name = %patch.name, pins, "patch loaded");
    }

    let mut terminal = ratatui::init();
    let result = UiApp::new(synth, scope_rx, sample_rate, patch_path).run(&mut terminal);
    ratatui::restore();

    drop(stream);
    result
}

fn wait_for_audio(synth: &mut Synthesizer<GraphController>) {
    let deadline = Instant::now() + READY_TIMEOUT;
    while Instant::now() < deadline {
        if synth.poll_readiness() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    warn!("audio is not running yet, pins stay unbuilt until it does");
}
