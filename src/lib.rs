//! Howler - polyphonic sample-playback engine
//!
//! A real-time instrument signal path: timestamped note events run through
//! a chord-expansion stage and a sample-accurate arpeggiator, then trigger
//! voices in a fixed 16-voice pool. Each voice plays an `Arc`-shared source
//! sample with linear-interpolated pitch shifting, an ADSR amplitude
//! contour, a vibrato LFO, and a state-variable low-pass filter. A mono
//! downmix of every rendered block is pushed into a lock-free ring for a
//! UI or telemetry reader on another thread.
//!
//! Features:
//! - Chord expansion (major / minor / 7th / 9th) of note-ons and note-offs
//! - Tempo-synced arpeggiator with octave span, gate-scheduled releases,
//!   and cross-block pending note-offs
//! - 16-voice pool with round-robin allocation and oldest-voice stealing
//! - WAV sample import via `hound`, any bit depth, mono or stereo
//! - Lock-free parameter snapshots (`arc-swap`) and SPSC telemetry ring
//!
//! ```
//! use howler::{shared_params, EngineParams, RenderPipeline, SourceSample, TimedEvent};
//!
//! let mut pipeline = RenderPipeline::new(shared_params(EngineParams::default()));
//! pipeline.prepare(44_100.0, 512);
//! pipeline
//!     .pool_mut()
//!     .add_sound(SourceSample::mono("sine", vec![0.0; 1024], 44_100.0, 60).into_shared());
//!
//! let mut events = vec![TimedEvent::note_on(0, 60, 100)];
//! let (mut left, mut right) = (vec![0.0f32; 512], vec![0.0f32; 512]);
//! pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));
//! ```

pub mod arp;
pub mod chord;
pub mod envelope;
pub mod filter;
pub mod midi_event;
pub mod params;
pub mod pipeline;
pub mod ring_channel;
pub mod sample;
pub mod sample_loader;
pub mod voice;
pub mod voice_pool;

pub use arp::{ArpRate, Arpeggiator};
pub use chord::{ChordEngine, ChordMode};
pub use envelope::{AdsrEnvelope, EnvelopeStage};
pub use filter::StateVariableFilter;
pub use midi_event::{insert_ordered, MidiMessage, TimedEvent};
pub use params::{publish, shared_params, EngineParams, SharedParams};
pub use pipeline::RenderPipeline;
pub use ring_channel::RingChannel;
pub use sample::{NoteSet, SourceSample};
pub use sample_loader::load_sample;
pub use voice::Voice;
pub use voice_pool::{VoicePool, NUM_VOICES};
