//! Engine parameters and the lock-free control/audio handoff
//!
//! The control side builds a full [`EngineParams`] value and publishes it
//! through an [`ArcSwap`]; the render pipeline loads one snapshot per block
//! and applies it before any events are processed. The audio thread never
//! blocks on the control thread and always sees a consistent set.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::arp::ArpRate;
use crate::chord::ChordMode;

/// Full parameter snapshot applied once per render block
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    // Amplitude envelope, times in seconds
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,

    // Per-voice low-pass filter
    pub cutoff: f32,
    pub resonance: f32,

    // Vibrato LFO
    pub lfo_rate: f32,
    pub lfo_depth: f32,

    pub master_gain: f32,

    // Chord expansion
    pub chord_mode: ChordMode,
    pub chord_key: u8,

    // Arpeggiator
    pub arp_enabled: bool,
    pub arp_rate: ArpRate,
    pub arp_mode: u8,
    pub arp_octaves: u32,
    pub arp_gate: f32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
            cutoff: 20_000.0,
            resonance: 0.0,
            lfo_rate: 5.0,
            lfo_depth: 0.0,
            master_gain: 0.5,
            chord_mode: ChordMode::Off,
            chord_key: 0,
            arp_enabled: false,
            arp_rate: ArpRate::Sixteenth,
            arp_mode: 0,
            arp_octaves: 1,
            arp_gate: 0.5,
        }
    }
}

/// Shared handle to the current parameter snapshot
pub type SharedParams = Arc<ArcSwap<EngineParams>>;

/// Create a shared parameter handle seeded with `initial`
pub fn shared_params(initial: EngineParams) -> SharedParams {
    Arc::new(ArcSwap::from_pointee(initial))
}

/// Publish a new snapshot; readers pick it up on their next load
pub fn publish(params: &SharedParams, new: EngineParams) {
    params.store(Arc::new(new));
}
