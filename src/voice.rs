//! A single sample-playback voice
//!
//! Each voice renders one triggered note from an `Arc`-shared source
//! sample: fractional-position playback with linear interpolation (the
//! pitch ratio comes from the note/root distance and the source/engine
//! rate mismatch), an ADSR gain contour, a vibrato LFO that modulates the
//! playback increment, and one low-pass filter run over both channels.
//! Voices accumulate into the mix buffers; they never own them.

use std::sync::Arc;

use crate::envelope::AdsrEnvelope;
use crate::filter::StateVariableFilter;
use crate::params::EngineParams;
use crate::sample::SourceSample;

/// Vibrato span at full depth: +/-5% of the playback increment
const LFO_PITCH_SPAN: f32 = 0.05;

/// One polyphonic voice. Idle unless `start_note` gave it a sample.
pub struct Voice {
    sound: Option<Arc<SourceSample>>,
    position: f64,
    pitch_ratio: f64,
    level: f32,
    looping: bool,
    note: u8,

    envelope: AdsrEnvelope,
    filter: StateVariableFilter,

    lfo_phase: f32,
    lfo_rate: f32,
    lfo_depth: f32,

    sample_rate: f64,
    /// Trigger ordinal, used by the pool for oldest-voice stealing
    age: u64,
    active: bool,
}

impl Voice {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sound: None,
            position: 0.0,
            pitch_ratio: 1.0,
            level: 0.0,
            looping: false,
            note: 0,
            envelope: AdsrEnvelope::new(sample_rate as f32),
            filter: StateVariableFilter::new(sample_rate as f32),
            lfo_phase: 0.0,
            lfo_rate: 5.0,
            lfo_depth: 0.0,
            sample_rate,
            age: 0,
            active: false,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
        self.envelope.set_sample_rate(self.sample_rate as f32);
        self.filter.prepare(self.sample_rate as f32);
        self.clear();
    }

    /// Trigger this voice on `sound` at `note`.
    ///
    /// The envelope is configured as an attack/hold/release contour from
    /// the sample's hints (decay 0, sustain 1.0); the per-block parameter
    /// broadcast overwrites all four values afterwards.
    pub fn start_note(&mut self, sound: Arc<SourceSample>, note: u8, velocity: u8, age: u64) {
        self.level = velocity as f32 / 127.0;
        self.pitch_ratio = semitone_ratio(note as i32 - sound.root_note() as i32)
            * (sound.source_sample_rate() / self.sample_rate);
        self.looping = sound.looping();
        self.note = note;
        self.position = 0.0;
        self.age = age;
        self.active = true;

        self.envelope
            .set_parameters(sound.attack_secs(), 0.0, 1.0, sound.release_secs());
        self.envelope.note_on();
        self.filter.reset();
        self.lfo_phase = 0.0;

        self.sound = Some(sound);
    }

    /// Release the voice. With `allow_tail_off` the envelope ramps out and
    /// the voice frees itself when the ramp finishes; without, it cuts now.
    pub fn stop_note(&mut self, allow_tail_off: bool) {
        if allow_tail_off {
            self.envelope.note_off();
        } else {
            self.clear();
        }
    }

    /// Hard-free the voice
    pub fn clear(&mut self) {
        self.sound = None;
        self.active = false;
        self.position = 0.0;
        self.envelope.reset();
    }

    /// Per-block parameter broadcast. Writes all four envelope values,
    /// replacing the trigger-time contour for sounding voices too.
    pub fn update_parameters(&mut self, params: &EngineParams) {
        self.envelope
            .set_parameters(params.attack, params.decay, params.sustain, params.release);
        self.filter.set_cutoff(params.cutoff);
        self.filter.set_resonance(params.resonance);
        self.lfo_rate = params.lfo_rate;
        self.lfo_depth = params.lfo_depth;
    }

    /// Accumulate this voice's output into the stereo mix buffers.
    ///
    /// Mono sources feed both channels; both channels pass through the one
    /// filter instance, advancing its state twice per frame (the engine's
    /// kept approximation). When a non-looping sample runs out, or the
    /// envelope's release ramp ends, the voice frees itself mid-block.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let sound = match &self.sound {
            Some(s) => Arc::clone(s),
            None => return,
        };
        let len = sound.len();
        if len == 0 {
            self.clear();
            return;
        }

        let stereo = sound.num_channels() == 2;
        let src_l = sound.channel(0);
        let src_r = if stereo { sound.channel(1) } else { src_l };
        let lfo_increment = self.lfo_rate / self.sample_rate as f32;

        for frame in 0..left.len() {
            let lfo = (self.lfo_phase * std::f32::consts::TAU).sin();
            self.lfo_phase = (self.lfo_phase + lfo_increment).fract();
            let pitch_mod = 1.0 + (lfo * self.lfo_depth * LFO_PITCH_SPAN) as f64;

            let idx = self.position as usize;
            let frac = (self.position - idx as f64) as f32;
            let next = if self.looping { (idx + 1) % len } else { idx + 1 };

            let (l1, r1) = (src_l[idx], src_r[idx]);
            let (l2, r2) = if next < len {
                (src_l[next], src_r[next])
            } else {
                (0.0, 0.0)
            };

            let mut l = l1 + (l2 - l1) * frac;
            let mut r = r1 + (r2 - r1) * frac;

            let gain = self.level * self.envelope.process();
            l = self.filter.process(l);
            r = self.filter.process(r);

            left[frame] += l * gain;
            right[frame] += r * gain;

            if !self.envelope.is_active() {
                self.clear();
                return;
            }

            self.position += self.pitch_ratio * pitch_mod;
            if self.position >= len as f64 {
                if self.looping {
                    // A pitch ratio above the loop length can step over the
                    // end by more than one full cycle, so wrap by modulo.
                    self.position %= len as f64;
                } else {
                    self.clear();
                    return;
                }
            }
        }
    }

    pub fn playing_note(&self) -> Option<u8> {
        if self.active {
            Some(self.note)
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn envelope_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn age(&self) -> u64 {
        self.age
    }
}

/// Equal-tempered pitch ratio for a signed semitone distance
fn semitone_ratio(semitones: i32) -> f64 {
    2f64.powf(semitones as f64 / 12.0)
}
