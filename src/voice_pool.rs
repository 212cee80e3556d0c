//! Fixed polyphony voice pool and block renderer
//!
//! Owns the sixteen voices and the registered source samples, routes note
//! events to voices (one voice per eligible sample), and renders blocks by
//! splitting them at event offsets so every note lands sample-accurately.
//! Allocation happens only at setup; the render path reuses the voices and
//! buffers it was given.

use std::sync::Arc;

use tracing::debug;

use crate::midi_event::{MidiMessage, TimedEvent};
use crate::params::EngineParams;
use crate::sample::SourceSample;
use crate::voice::Voice;

/// Fixed polyphony
pub const NUM_VOICES: usize = 16;

/// Voice allocator plus sample registry
pub struct VoicePool {
    voices: Vec<Voice>,
    sounds: Vec<Arc<SourceSample>>,
    /// Round-robin scan start for idle-voice search
    next_voice_index: usize,
    /// Monotonic trigger counter backing oldest-voice stealing
    age_counter: u64,
    sample_rate: f64,
}

impl VoicePool {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_voices(sample_rate, NUM_VOICES)
    }

    /// Pool with a custom voice count, used by tests and benches
    pub fn with_voices(sample_rate: f64, num_voices: usize) -> Self {
        let voices = (0..num_voices).map(|_| Voice::new(sample_rate)).collect();
        Self {
            voices,
            sounds: Vec::new(),
            next_voice_index: 0,
            age_counter: 0,
            sample_rate,
        }
    }

    /// Register a sample; notes matching its note set will trigger it
    pub fn add_sound(&mut self, sound: Arc<SourceSample>) {
        debug!(name = sound.name(), frames = sound.len(), "registered sound");
        self.sounds.push(sound);
    }

    pub fn clear_sounds(&mut self) {
        self.sounds.clear();
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.prepare(sample_rate);
        }
        self.next_voice_index = 0;
    }

    /// Broadcast the block's parameter snapshot to every voice
    pub fn update_parameters(&mut self, params: &EngineParams) {
        for voice in &mut self.voices {
            voice.update_parameters(params);
        }
    }

    /// Trigger `note`: same-note voices are released first, then one voice
    /// starts per sample whose note set contains the note.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        for voice in &mut self.voices {
            if voice.playing_note() == Some(note) {
                voice.stop_note(true);
            }
        }

        for sound_index in 0..self.sounds.len() {
            if !self.sounds[sound_index].applies_to(note) {
                continue;
            }
            let sound = Arc::clone(&self.sounds[sound_index]);
            self.age_counter += 1;
            let age = self.age_counter;
            let voice_index = self.find_voice();
            self.voices[voice_index].start_note(sound, note, velocity, age);
            self.next_voice_index = (voice_index + 1) % self.voices.len();
        }
    }

    /// Release every voice playing `note`
    pub fn note_off(&mut self, note: u8, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if voice.playing_note() == Some(note) {
                voice.stop_note(allow_tail_off);
            }
        }
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) {
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.stop_note(allow_tail_off);
            }
        }
    }

    /// Render a block into `left`/`right` (accumulating), handling `events`
    /// at their sample offsets. Offsets past the block end clamp to it;
    /// events must arrive offset-ordered.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32], events: &[TimedEvent]) {
        let num_samples = left.len().min(right.len());
        let mut pos = 0usize;

        for event in events {
            let offset = event.offset.min(num_samples);
            if offset > pos {
                self.render_voices(&mut left[pos..offset], &mut right[pos..offset]);
                pos = offset;
            }
            self.handle_event(&event.message);
        }

        if pos < num_samples {
            self.render_voices(&mut left[pos..num_samples], &mut right[pos..num_samples]);
        }
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    fn handle_event(&mut self, message: &MidiMessage) {
        match *message {
            MidiMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            MidiMessage::NoteOff { note } => self.note_off(note, true),
            MidiMessage::AllNotesOff => self.all_notes_off(true),
            // Pitch bend and CCs other than 123 are not mapped to anything
            _ => {}
        }
    }

    fn render_voices(&mut self, left: &mut [f32], right: &mut [f32]) {
        for voice in &mut self.voices {
            if !voice.is_active() {
                continue;
            }
            voice.render(left, right);
            if voice.is_active() && !voice.envelope_active() {
                voice.stop_note(false);
            }
        }
    }

    /// Idle voice by round-robin scan, else steal the oldest trigger
    fn find_voice(&self) -> usize {
        let n = self.voices.len();
        for i in 0..n {
            let idx = (self.next_voice_index + i) % n;
            if !self.voices[idx].is_active() {
                return idx;
            }
        }
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
