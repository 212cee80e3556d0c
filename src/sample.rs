//! Immutable source-sample data and note eligibility
//!
//! A `SourceSample` is constructed once (deep copy of the import buffer)
//! and never mutated afterwards, so many voices can hold `Arc` references
//! to it while rendering concurrently-triggered notes. The note range it
//! responds to is a fixed 128-bit set over MIDI note numbers.

use std::ops::RangeInclusive;
use std::sync::Arc;

/// Membership set over the 128 MIDI note numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteSet {
    bits: [u64; 2],
}

impl NoteSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every note in `range` (inclusive); notes above 127 are ignored
    pub fn from_range(range: RangeInclusive<u8>) -> Self {
        let mut set = Self::empty();
        for note in range {
            set.insert(note);
        }
        set
    }

    pub fn insert(&mut self, note: u8) {
        if note <= 127 {
            self.bits[(note >> 6) as usize] |= 1u64 << (note & 63);
        }
    }

    pub fn contains(&self, note: u8) -> bool {
        if note > 127 {
            return false;
        }
        self.bits[(note >> 6) as usize] & (1u64 << (note & 63)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == [0, 0]
    }
}

/// Immutable sample data plus playback metadata.
///
/// Shared read-only between voices as `Arc<SourceSample>`; a voice never
/// owns the sample's lifetime.
#[derive(Debug, Clone)]
pub struct SourceSample {
    name: String,
    /// 1 channel = mono, 2 = stereo; all channels equal length
    channels: Vec<Vec<f32>>,
    source_sample_rate: f64,
    notes: NoteSet,
    root_note: u8,
    looping: bool,
    attack_secs: f32,
    release_secs: f32,
}

impl SourceSample {
    /// Deep-copies `channels` so the caller's import buffer can be freed.
    ///
    /// Panics if the channel lengths differ or there are more than two
    /// channels; sample construction happens off the audio thread, so this
    /// is a load-time contract, not a render-time hazard.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        channels: &[Vec<f32>],
        source_sample_rate: f64,
        notes: NoteSet,
        root_note: u8,
        looping: bool,
        attack_secs: f32,
        release_secs: f32,
    ) -> Self {
        assert!(
            !channels.is_empty() && channels.len() <= 2,
            "SourceSample supports 1 or 2 channels, got {}",
            channels.len()
        );
        assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "SourceSample channels must have equal length"
        );

        Self {
            name: name.to_string(),
            channels: channels.to_vec(),
            source_sample_rate,
            notes,
            root_note,
            looping,
            attack_secs,
            release_secs,
        }
    }

    /// Convenience constructor for a mono sample shared across the full
    /// keyboard, mostly used by tests and the demo binary.
    pub fn mono(name: &str, data: Vec<f32>, source_sample_rate: f64, root_note: u8) -> Self {
        Self::new(
            name,
            &[data],
            source_sample_rate,
            NoteSet::from_range(0..=127),
            root_note,
            false,
            0.01,
            0.1,
        )
    }

    /// Whether this sample responds to `note`
    pub fn applies_to(&self, note: u8) -> bool {
        self.notes.contains(note)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn source_sample_rate(&self) -> f64 {
        self.source_sample_rate
    }

    pub fn root_note(&self) -> u8 {
        self.root_note
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn attack_secs(&self) -> f32 {
        self.attack_secs
    }

    pub fn release_secs(&self) -> f32 {
        self.release_secs
    }

    pub fn into_shared(self) -> Arc<SourceSample> {
        Arc::new(self)
    }
}
