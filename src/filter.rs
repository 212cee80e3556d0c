//! Per-voice low-pass filter
//!
//! Topology-preserving-transform state-variable filter, low-pass output.
//! Two integrator states per instance. Each voice owns exactly one
//! instance and runs both stereo channels through it, which advances the
//! state twice per frame and shifts the effective cutoff slightly; that is
//! the engine's documented approximation and is kept on purpose.

use std::f32::consts::PI;

/// TPT state-variable low-pass filter
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,

    // Coefficients derived from cutoff/resonance
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,

    // Integrator states
    ic1eq: f32,
    ic2eq: f32,
}

impl StateVariableFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate.max(1.0),
            cutoff: 20_000.0,
            resonance: 0.0,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_coefficients();
        self.reset();
    }

    /// Cutoff in Hz, clamped to [20, 0.49 * sample_rate]
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let max_cutoff = self.sample_rate * 0.49;
        let clamped = cutoff.clamp(20.0, max_cutoff);
        if clamped != self.cutoff {
            self.cutoff = clamped;
            self.update_coefficients();
        }
    }

    /// Resonance in [0, 1], clamped below self-oscillation
    pub fn set_resonance(&mut self, resonance: f32) {
        let clamped = resonance.clamp(0.0, 0.99);
        if clamped != self.resonance {
            self.resonance = clamped;
            self.update_coefficients();
        }
    }

    /// Clear the integrator states (voice retrigger)
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Process one sample, returning the low-pass output
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    fn update_coefficients(&mut self) {
        self.g = (PI * self.cutoff / self.sample_rate).tan();
        self.k = 2.0 - 2.0 * self.resonance;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.a2 = self.g * self.a1;
        self.a3 = self.g * self.a2;
    }
}
