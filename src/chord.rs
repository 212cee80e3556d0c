//! Chord expansion of the incoming event stream
//!
//! The first stage of the MIDI transform pipeline. Stateless per call:
//! every note-on and note-off is replaced by one event per chord tone at
//! the same offset and velocity, non-note events pass through untouched,
//! and mode Off is an exact no-op. Runs before the arpeggiator, so held
//! chords arpeggiate as their expanded tones.

use crate::midi_event::{MidiMessage, TimedEvent};

/// Chord shape selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChordMode {
    #[default]
    Off,
    Major,
    Minor,
    Seventh,
    Ninth,
}

impl ChordMode {
    /// Semitone offsets applied to each played note
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordMode::Off => &[0],
            ChordMode::Major => &[0, 4, 7],
            ChordMode::Minor => &[0, 3, 7],
            ChordMode::Seventh => &[0, 4, 7, 10],
            ChordMode::Ninth => &[0, 4, 7, 14],
        }
    }

    /// Selector-index mapping used by the parameter layer (0 = off)
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => ChordMode::Major,
            2 => ChordMode::Minor,
            3 => ChordMode::Seventh,
            4 => ChordMode::Ninth,
            _ => ChordMode::Off,
        }
    }
}

/// Stateless chord-expansion stage.
///
/// Holds only its configuration and a reused scratch buffer; the output is
/// a pure function of (mode, input events). Output offsets are
/// non-decreasing whenever the input's are.
pub struct ChordEngine {
    mode: ChordMode,
    /// Key-signature input, accepted but not yet used by any chord shape
    key: u8,
    scratch: Vec<TimedEvent>,
}

impl ChordEngine {
    pub fn new() -> Self {
        Self {
            mode: ChordMode::Off,
            key: 0,
            scratch: Vec::with_capacity(256),
        }
    }

    pub fn set_parameters(&mut self, mode: ChordMode, key: u8) {
        self.mode = mode;
        self.key = key;
    }

    pub fn mode(&self) -> ChordMode {
        self.mode
    }

    /// Rewrite `events` in place. Mode Off leaves the buffer untouched.
    ///
    /// Resulting note numbers are not clamped here: tones that land above
    /// 127 pass through (the sample-eligibility set ignores them and the
    /// arpeggiator clamps), per the pipeline's clamping split.
    pub fn process(&mut self, events: &mut Vec<TimedEvent>) {
        if self.mode == ChordMode::Off {
            return;
        }

        self.scratch.clear();
        for event in events.iter() {
            match event.message {
                MidiMessage::NoteOn { note, velocity } => {
                    for &interval in self.mode.intervals() {
                        if let Some(tone) = chord_tone(note, interval) {
                            self.scratch.push(TimedEvent::note_on(event.offset, tone, velocity));
                        }
                    }
                }
                MidiMessage::NoteOff { note } => {
                    for &interval in self.mode.intervals() {
                        if let Some(tone) = chord_tone(note, interval) {
                            self.scratch.push(TimedEvent::note_off(event.offset, tone));
                        }
                    }
                }
                _ => self.scratch.push(*event),
            }
        }

        std::mem::swap(events, &mut self.scratch);
    }
}

impl Default for ChordEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Unclamped chord tone; `None` only when the tone exceeds what a note
/// number can carry at all (possible only for malformed input notes).
fn chord_tone(root: u8, interval: u8) -> Option<u8> {
    root.checked_add(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_mode_is_identity() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Off, 0);

        let original = vec![
            TimedEvent::note_on(0, 60, 100),
            TimedEvent::new(
                10,
                MidiMessage::ControlChange {
                    controller: 1,
                    value: 64,
                },
            ),
            TimedEvent::note_off(32, 60),
        ];
        let mut events = original.clone();
        engine.process(&mut events);
        engine.process(&mut events); // twice, per the identity property
        assert_eq!(events, original);
    }

    #[test]
    fn test_major_mode_expands_note_on() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Major, 0);

        let mut events = vec![TimedEvent::note_on(0, 60, 100)];
        engine.process(&mut events);

        assert_eq!(
            events,
            vec![
                TimedEvent::note_on(0, 60, 100),
                TimedEvent::note_on(0, 64, 100),
                TimedEvent::note_on(0, 67, 100),
            ]
        );
    }

    #[test]
    fn test_note_off_expands_with_matching_tones() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Minor, 0);

        let mut events = vec![TimedEvent::note_off(16, 57)];
        engine.process(&mut events);

        assert_eq!(
            events,
            vec![
                TimedEvent::note_off(16, 57),
                TimedEvent::note_off(16, 60),
                TimedEvent::note_off(16, 64),
            ]
        );
    }

    #[test]
    fn test_ninth_adds_the_extended_tone() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Ninth, 0);

        let mut events = vec![TimedEvent::note_on(0, 48, 90)];
        engine.process(&mut events);

        let notes: Vec<u8> = events
            .iter()
            .filter_map(|e| match e.message {
                MidiMessage::NoteOn { note, .. } => Some(note),
                _ => None,
            })
            .collect();
        assert_eq!(notes, vec![48, 52, 55, 62]);
    }

    #[test]
    fn test_non_note_events_pass_through_at_offset() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Seventh, 0);

        let bend = TimedEvent::new(7, MidiMessage::PitchBend { value: 1024 });
        let mut events = vec![TimedEvent::note_on(0, 60, 100), bend];
        engine.process(&mut events);

        assert_eq!(*events.last().unwrap(), bend);
        assert_eq!(events.len(), 5, "four chord tones plus the pitch bend");
    }

    #[test]
    fn test_tones_above_127_pass_unclamped() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Ninth, 0);

        let mut events = vec![TimedEvent::note_on(0, 120, 100)];
        engine.process(&mut events);

        let notes: Vec<u8> = events
            .iter()
            .filter_map(|e| match e.message {
                MidiMessage::NoteOn { note, .. } => Some(note),
                _ => None,
            })
            .collect();
        // 120 + 14 = 134: above the MIDI range but not clamped here.
        assert_eq!(notes, vec![120, 124, 127, 134]);
    }

    #[test]
    fn test_offsets_stay_non_decreasing() {
        let mut engine = ChordEngine::new();
        engine.set_parameters(ChordMode::Major, 0);

        let mut events = vec![
            TimedEvent::note_on(0, 60, 100),
            TimedEvent::note_on(128, 62, 80),
            TimedEvent::note_off(256, 60),
        ];
        engine.process(&mut events);

        assert!(
            events.windows(2).all(|w| w[0].offset <= w[1].offset),
            "chord expansion must preserve offset ordering"
        );
    }
}
