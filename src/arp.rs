//! Sample-accurate arpeggiator sequencer
//!
//! The stateful second stage of the MIDI transform pipeline. While
//! enabled it captures incoming note-ons into a sorted held-note set and
//! replaces them with its own generated note stream: a monotonically
//! increasing step index mapped over the held notes across the configured
//! octave span, stepped at a host-tempo-derived rate. Generated note-offs
//! are scheduled a gate fraction after each note-on and carried across
//! block boundaries as pending releases when they fall outside the block.
//!
//! Step boundaries are found by walking the block in small increments, so
//! a step landing mid-block fires at (near) sample accuracy instead of
//! being rounded to the block edge.

use crate::midi_event::{insert_ordered, MidiMessage, TimedEvent};

/// Velocity of every generated note-on
const ARP_VELOCITY: u8 = 100;

/// Granularity of the in-block step scan, in samples
const STEP_SCAN_SAMPLES: usize = 32;

/// Step durations below this are considered degenerate
const MIN_STEP_SAMPLES: f64 = 100.0;

/// Replacement duration for degenerate steps, to avoid runaway stepping
const FALLBACK_STEP_SAMPLES: f64 = 10_000.0;

/// Saturating step-time value that makes the next step fire immediately
const INSTANT_TRIGGER: f64 = 1_000_000.0;

const DEFAULT_BPM: f64 = 120.0;
const MIN_BPM: f64 = 20.0;

/// Musical step rate, as a division of a quarter note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArpRate {
    Quarter,
    Eighth,
    #[default]
    Sixteenth,
    ThirtySecond,
}

impl ArpRate {
    /// How many steps fit in one quarter note
    pub fn division(self) -> f64 {
        match self {
            ArpRate::Quarter => 1.0,
            ArpRate::Eighth => 2.0,
            ArpRate::Sixteenth => 4.0,
            ArpRate::ThirtySecond => 8.0,
        }
    }

    /// Mapping from the normalized rate knob
    pub fn from_normalized(value: f32) -> Self {
        if value <= 0.1 {
            ArpRate::Quarter
        } else if value <= 0.4 {
            ArpRate::Eighth
        } else if value <= 0.7 {
            ArpRate::Sixteenth
        } else {
            ArpRate::ThirtySecond
        }
    }
}

/// A generated note-off that falls in a future block
#[derive(Debug, Clone, Copy)]
struct PendingOff {
    note: u8,
    samples_remaining: usize,
}

/// Stateful arpeggiator. One instance per pipeline; all state is owned
/// here and mutated only through [`Arpeggiator::process`], so the
/// sequencer is testable without an audio thread.
pub struct Arpeggiator {
    // Configuration
    rate: ArpRate,
    /// Direction selector, accepted for parameter-layout compatibility;
    /// only the ascending pattern is generated.
    mode: u8,
    octaves: u32,
    gate: f32,
    enabled: bool,
    sample_rate: f64,

    // Sequencer state
    held_notes: Vec<u8>,
    current_step: usize,
    /// Samples accumulated toward the next step boundary
    step_time: f64,
    pending_offs: Vec<PendingOff>,
    scratch: Vec<TimedEvent>,
}

impl Arpeggiator {
    pub fn new() -> Self {
        Self {
            rate: ArpRate::Sixteenth,
            mode: 0,
            octaves: 1,
            gate: 0.5,
            enabled: false,
            sample_rate: 44_100.0,
            held_notes: Vec::with_capacity(128),
            current_step: 0,
            step_time: 0.0,
            pending_offs: Vec::with_capacity(64),
            scratch: Vec::with_capacity(256),
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// Update configuration; takes effect on the next processed block and
    /// never resets held-note state.
    pub fn set_parameters(&mut self, rate: ArpRate, mode: u8, octaves: u32, gate: f32, enabled: bool) {
        self.rate = rate;
        self.mode = mode;
        self.octaves = octaves.max(1);
        self.gate = gate;
        self.enabled = enabled;
    }

    /// Clear held notes, pending releases, and the step clock. Used on
    /// transport stop / all-notes-off; configuration is untouched.
    pub fn reset(&mut self) {
        self.held_notes.clear();
        self.pending_offs.clear();
        self.current_step = 0;
        self.step_time = 0.0;
    }

    /// Currently held notes, unique and ascending
    pub fn held_notes(&self) -> &[u8] {
        &self.held_notes
    }

    /// Note-offs scheduled beyond the current block
    pub fn pending_count(&self) -> usize {
        self.pending_offs.len()
    }

    /// Core per-block state transition. Rewrites `events` in place:
    /// captured note-ons/offs are consumed, generated note-ons/offs and
    /// due pending releases are merged in, non-note events pass through.
    /// Output offsets are non-decreasing.
    pub fn process(
        &mut self,
        events: &mut Vec<TimedEvent>,
        num_samples: usize,
        tempo_bpm: Option<f64>,
    ) {
        if !self.enabled {
            // Notes already sounding still get their scheduled offs even
            // when arpeggiation was toggled off mid-note. Input events are
            // left alone.
            drain_pending(&mut self.pending_offs, events, num_samples);
            return;
        }

        self.scratch.clear();

        // Capture phase: note events feed the held set, everything else
        // passes through. Captured notes are NOT forwarded; downstream
        // voices only ever see the generated stream.
        for i in 0..events.len() {
            let event = events[i];
            match event.message {
                MidiMessage::NoteOn { note, .. } => self.capture_note_on(note),
                MidiMessage::NoteOff { note } => self.capture_note_off(note),
                MidiMessage::AllNotesOff => self.reset(),
                _ => self.scratch.push(event),
            }
        }

        // Scheduled note-offs due in this block
        drain_pending(&mut self.pending_offs, &mut self.scratch, num_samples);

        if self.held_notes.is_empty() {
            std::mem::swap(events, &mut self.scratch);
            return;
        }

        let mut samples_per_step = self.samples_per_step(tempo_bpm);
        if samples_per_step < MIN_STEP_SAMPLES {
            samples_per_step = FALLBACK_STEP_SAMPLES;
        }
        // An instant-trigger saturation (or a rate change) may have left
        // the accumulator past the step length; clamp so exactly one step
        // fires at the block start.
        if self.step_time > samples_per_step {
            self.step_time = samples_per_step;
        }

        let mut pos = 0usize;
        let mut remaining = num_samples;
        while remaining > 0 {
            if self.step_time >= samples_per_step {
                self.step_time -= samples_per_step;
                self.fire_step(pos, num_samples, samples_per_step);
            }
            let advance = remaining.min(STEP_SCAN_SAMPLES);
            self.step_time += advance as f64;
            remaining -= advance;
            pos += advance;
        }

        std::mem::swap(events, &mut self.scratch);
    }

    fn capture_note_on(&mut self, note: u8) {
        let was_empty = self.held_notes.is_empty();

        if let Err(idx) = self.held_notes.binary_search(&note) {
            self.held_notes.insert(idx, note);
        }

        // First press after silence: force the next step to fire as early
        // as possible instead of waiting out the accumulated step time.
        if was_empty {
            self.current_step = 0;
            self.step_time = INSTANT_TRIGGER;
        }
    }

    fn capture_note_off(&mut self, note: u8) {
        self.held_notes.retain(|&n| n != note);
    }

    /// The note for the current step: ascending through the held set, then
    /// repeating an octave up for each additional octave of the span.
    fn next_note(&self) -> Option<u8> {
        if self.held_notes.is_empty() {
            return None;
        }
        let total_steps = self.held_notes.len() * self.octaves as usize;
        if total_steps == 0 {
            return None;
        }

        let wrapped = self.current_step % total_steps;
        let note_index = wrapped % self.held_notes.len();
        let octave_offset = wrapped / self.held_notes.len();

        let note = self.held_notes[note_index] as usize + 12 * octave_offset;
        Some(note.min(127) as u8)
    }

    fn fire_step(&mut self, pos: usize, num_samples: usize, samples_per_step: f64) {
        if let Some(note) = self.next_note() {
            if note > 0 {
                insert_ordered(&mut self.scratch, TimedEvent::note_on(pos, note, ARP_VELOCITY));

                let gate_samples = (samples_per_step * self.gate as f64) as usize;
                if pos + gate_samples < num_samples {
                    insert_ordered(
                        &mut self.scratch,
                        TimedEvent::note_off(pos + gate_samples, note),
                    );
                } else {
                    self.pending_offs.push(PendingOff {
                        note,
                        samples_remaining: gate_samples - (num_samples - pos),
                    });
                }
            }
        }
        self.current_step += 1;
    }

    fn samples_per_step(&self, tempo_bpm: Option<f64>) -> f64 {
        let mut bpm = tempo_bpm.unwrap_or(DEFAULT_BPM);
        if !bpm.is_finite() || bpm <= 0.0 || bpm < MIN_BPM {
            bpm = DEFAULT_BPM;
        }
        let quarter_note_samples = (60.0 / bpm) * self.sample_rate;
        quarter_note_samples / self.rate.division()
    }

}

/// Emit pending note-offs due within this block into `events`; decrement
/// the rest by the block length.
fn drain_pending(pending: &mut Vec<PendingOff>, events: &mut Vec<TimedEvent>, num_samples: usize) {
    let mut i = 0;
    while i < pending.len() {
        if pending[i].samples_remaining < num_samples {
            let off = pending.remove(i);
            insert_ordered(events, TimedEvent::note_off(off.samples_remaining, off.note));
        } else {
            pending[i].samples_remaining -= num_samples;
            i += 1;
        }
    }
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self::new()
    }
}
