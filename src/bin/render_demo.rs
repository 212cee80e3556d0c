//! Offline render demo
//!
//! Drives the full pipeline without an audio device: loads a WAV sample
//! (or synthesizes a decaying harmonic tone), scripts a short chord/arp
//! performance, renders it block by block, and writes the result to a
//! stereo WAV file. The telemetry ring is drained on the way, the same
//! way a UI thread would.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use howler::{
    load_sample, publish, shared_params, ArpRate, ChordMode, EngineParams, NoteSet,
    RenderPipeline, SourceSample, TimedEvent,
};

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK_SIZE: usize = 512;

#[derive(Parser)]
#[command(name = "render_demo", about = "Render a scripted performance to WAV")]
struct Args {
    /// Output WAV path
    #[arg(short, long, default_value = "howler_demo.wav")]
    output: PathBuf,

    /// Length of the render in seconds
    #[arg(short, long, default_value_t = 6.0)]
    seconds: f32,

    /// Tempo for the arpeggiator
    #[arg(short, long, default_value_t = 120.0)]
    bpm: f64,

    /// Chord mode: off, major, minor, seventh, ninth
    #[arg(short, long, default_value = "major")]
    chord: String,

    /// Enable the arpeggiator
    #[arg(short, long)]
    arp: bool,

    /// WAV file to use as the source sample (synthesized tone if omitted)
    #[arg(long)]
    sample: Option<PathBuf>,
}

fn chord_mode(name: &str) -> ChordMode {
    match name {
        "major" => ChordMode::Major,
        "minor" => ChordMode::Minor,
        "seventh" => ChordMode::Seventh,
        "ninth" => ChordMode::Ninth,
        _ => ChordMode::Off,
    }
}

/// Decaying harmonic tone at middle C, two seconds long
fn synth_tone() -> SourceSample {
    let len = (SAMPLE_RATE * 2.0) as usize;
    let freq = 261.63;
    let mut data = Vec::with_capacity(len);
    for i in 0..len {
        let t = i as f64 / SAMPLE_RATE;
        let env = (-3.0 * t).exp();
        let fundamental = (std::f64::consts::TAU * freq * t).sin();
        let second = 0.4 * (std::f64::consts::TAU * freq * 2.0 * t).sin();
        let third = 0.2 * (std::f64::consts::TAU * freq * 3.0 * t).sin();
        data.push(((fundamental + second + third) * env * 0.5) as f32);
    }
    SourceSample::mono("synth_tone", data, SAMPLE_RATE, 60)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let params = shared_params(EngineParams::default());
    let mut pipeline = RenderPipeline::new(params.clone());
    pipeline.prepare(SAMPLE_RATE, BLOCK_SIZE);

    let sound = match &args.sample {
        Some(path) => load_sample(
            "user_sample",
            path,
            NoteSet::from_range(0..=127),
            60,
            false,
            0.005,
            0.2,
        )?,
        None => synth_tone().into_shared(),
    };
    pipeline.pool_mut().add_sound(sound);

    publish(
        &params,
        EngineParams {
            attack: 0.005,
            release: 0.3,
            cutoff: 8_000.0,
            resonance: 0.2,
            lfo_rate: 5.0,
            lfo_depth: 0.3,
            chord_mode: chord_mode(&args.chord),
            arp_enabled: args.arp,
            arp_rate: ArpRate::Sixteenth,
            arp_octaves: 2,
            arp_gate: 0.6,
            ..EngineParams::default()
        },
    );

    let total_samples = (args.seconds as f64 * SAMPLE_RATE) as usize;
    let num_blocks = total_samples.div_ceil(BLOCK_SIZE);

    // Scripted performance: a C at the start, an A minor shift two seconds
    // in, everything off half a second before the end.
    let on_block = |secs: f64| ((secs * SAMPLE_RATE) as usize) / BLOCK_SIZE;
    let first_change = on_block(2.0);
    let last_off = on_block(args.seconds as f64 - 0.5).min(num_blocks.saturating_sub(1));

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.output, spec)?;

    let ring = pipeline.ring();
    let mut telemetry = Vec::new();
    let mut telemetry_total = 0usize;

    let mut left = vec![0.0f32; BLOCK_SIZE];
    let mut right = vec![0.0f32; BLOCK_SIZE];
    let mut events: Vec<TimedEvent> = Vec::new();

    for block in 0..num_blocks {
        events.clear();
        if block == 0 {
            events.push(TimedEvent::note_on(0, 60, 110));
        } else if block == first_change {
            events.push(TimedEvent::note_off(0, 60));
            events.push(TimedEvent::note_on(64, 57, 100));
        } else if block == last_off {
            events.push(TimedEvent::note_off(0, 57));
        }

        pipeline.process_block(&mut events, &mut left, &mut right, Some(args.bpm));

        for i in 0..BLOCK_SIZE {
            writer.write_sample(left[i])?;
            writer.write_sample(right[i])?;
        }

        telemetry_total += ring.pop(&mut telemetry);
    }

    writer.finalize()?;
    info!(
        path = %args.output.display(),
        blocks = num_blocks,
        telemetry_samples = telemetry_total,
        "render complete"
    );

    Ok(())
}
