//! Timestamped MIDI-like event model for the render pipeline
//!
//! Every event carries an integer sample offset within the current render
//! block. The transform stages (chord expansion, arpeggiator) rewrite lists
//! of these events; every stage keeps its output in non-decreasing offset
//! order, and `insert_ordered` is the shared primitive that maintains that
//! postcondition without reordering events that share an offset.

/// A decoded MIDI-style message. The engine is omni, so the channel nibble
/// is dropped at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// CC 123: stops everything and clears sequencer state
    AllNotesOff,
    ControlChange { controller: u8, value: u8 },
    PitchBend { value: i16 },
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a message.
    ///
    /// Note-on with velocity 0 decodes as note-off, and CC 123 decodes as
    /// `AllNotesOff`. Returns `None` for messages the engine has no use for
    /// (program change, system messages, truncated data).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let status = bytes[0];
        match status & 0xF0 {
            0x90 if bytes.len() >= 3 && bytes[2] > 0 => Some(MidiMessage::NoteOn {
                note: bytes[1],
                velocity: bytes[2],
            }),
            0x90 if bytes.len() >= 3 => Some(MidiMessage::NoteOff { note: bytes[1] }),
            0x80 if bytes.len() >= 3 => Some(MidiMessage::NoteOff { note: bytes[1] }),
            0xB0 if bytes.len() >= 3 && bytes[1] == 123 => Some(MidiMessage::AllNotesOff),
            0xB0 if bytes.len() >= 3 => Some(MidiMessage::ControlChange {
                controller: bytes[1],
                value: bytes[2],
            }),
            0xE0 if bytes.len() >= 3 => {
                let lsb = bytes[1] as i16;
                let msb = bytes[2] as i16;
                Some(MidiMessage::PitchBend {
                    value: ((msb << 7) | lsb) - 8192,
                })
            }
            _ => None,
        }
    }

    /// True for note-on/note-off, the messages the transforms rewrite
    pub fn is_note(&self) -> bool {
        matches!(
            self,
            MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. }
        )
    }
}

/// A message plus its sample offset within the current render block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Sample offset within the block, `0..block_len`
    pub offset: usize,
    pub message: MidiMessage,
}

impl TimedEvent {
    pub fn new(offset: usize, message: MidiMessage) -> Self {
        Self { offset, message }
    }

    pub fn note_on(offset: usize, note: u8, velocity: u8) -> Self {
        Self::new(offset, MidiMessage::NoteOn { note, velocity })
    }

    pub fn note_off(offset: usize, note: u8) -> Self {
        Self::new(offset, MidiMessage::NoteOff { note })
    }
}

/// Insert an event into an offset-ordered list, after any events that share
/// its offset. Keeps the list sorted without disturbing the relative order
/// of same-offset events, and performs no allocation when the list has
/// spare capacity.
pub fn insert_ordered(events: &mut Vec<TimedEvent>, event: TimedEvent) {
    let idx = events.partition_point(|e| e.offset <= event.offset);
    events.insert(idx, event);
}
