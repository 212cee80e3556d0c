//! The per-block render pipeline
//!
//! Ties the stages together in their fixed order: load the parameter
//! snapshot, apply it to every stage, run chord expansion then the
//! arpeggiator over the block's events, render the voice pool into the
//! stereo buffers, apply master gain, and push a mono downmix into the
//! telemetry ring. One instance per engine; `process_block` is the only
//! function the audio thread calls per block and it does not allocate
//! after `prepare`.

use std::sync::Arc;

use tracing::debug;

use crate::arp::Arpeggiator;
use crate::chord::ChordEngine;
use crate::midi_event::TimedEvent;
use crate::params::SharedParams;
use crate::ring_channel::{RingChannel, DEFAULT_CAPACITY};
use crate::voice_pool::VoicePool;

/// Full signal path from timed events to stereo output
pub struct RenderPipeline {
    chord: ChordEngine,
    arp: Arpeggiator,
    pool: VoicePool,
    ring: Arc<RingChannel>,
    params: SharedParams,
    /// Reused mono downmix buffer for the telemetry push
    mono_scratch: Vec<f32>,
}

impl RenderPipeline {
    pub fn new(params: SharedParams) -> Self {
        Self {
            chord: ChordEngine::new(),
            arp: Arpeggiator::new(),
            pool: VoicePool::new(44_100.0),
            ring: Arc::new(RingChannel::new(DEFAULT_CAPACITY)),
            params,
            mono_scratch: Vec::new(),
        }
    }

    /// Size everything for the engine rate and the largest block the host
    /// will send. Must run before the first `process_block`.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.arp.prepare(sample_rate);
        self.pool.prepare(sample_rate);
        self.mono_scratch.clear();
        self.mono_scratch.reserve(max_block_size);
        debug!(sample_rate, max_block_size, "pipeline prepared");
    }

    /// Render one block. `events` is rewritten in place by the transform
    /// stages; `left`/`right` are overwritten with the block's output.
    pub fn process_block(
        &mut self,
        events: &mut Vec<TimedEvent>,
        left: &mut [f32],
        right: &mut [f32],
        tempo_bpm: Option<f64>,
    ) {
        let num_samples = left.len().min(right.len());
        let params = self.params.load();

        self.chord.set_parameters(params.chord_mode, params.chord_key);
        self.arp.set_parameters(
            params.arp_rate,
            params.arp_mode,
            params.arp_octaves,
            params.arp_gate,
            params.arp_enabled,
        );
        self.pool.update_parameters(&params);

        self.chord.process(events);
        self.arp.process(events, num_samples, tempo_bpm);

        left[..num_samples].fill(0.0);
        right[..num_samples].fill(0.0);
        self.pool.render_block(&mut left[..num_samples], &mut right[..num_samples], events);

        let gain = params.master_gain;
        for sample in &mut left[..num_samples] {
            *sample *= gain;
        }
        for sample in &mut right[..num_samples] {
            *sample *= gain;
        }

        self.mono_scratch.clear();
        for i in 0..num_samples {
            self.mono_scratch.push((left[i] + right[i]) * 0.5);
        }
        self.ring.push(&self.mono_scratch);
    }

    /// Silence everything: voices cut, sequencer state cleared
    pub fn reset(&mut self) {
        self.pool.all_notes_off(false);
        self.arp.reset();
    }

    pub fn pool_mut(&mut self) -> &mut VoicePool {
        &mut self.pool
    }

    /// The telemetry ring; clone the handle for the reader thread
    pub fn ring(&self) -> Arc<RingChannel> {
        Arc::clone(&self.ring)
    }

    pub fn params(&self) -> SharedParams {
        Arc::clone(&self.params)
    }
}
