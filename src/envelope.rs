//! Per-voice amplitude envelope
//!
//! Linear ADSR generator driven one sample at a time from the voice render
//! loop. The sampler configures it as an attack/hold/release contour at
//! trigger time (decay 0, sustain 1.0); the full four stages exist because
//! the per-block parameter broadcast writes all four values.

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR envelope generator
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    // Parameters: times in seconds, sustain is a level
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,

    stage: EnvelopeStage,
    level: f32,
    time_in_stage: f32,
    /// Level at the moment the current stage began; attack and release
    /// ramp from here so retriggers and early note-offs never click.
    stage_start_level: f32,
    sample_rate: f32,
}

impl AdsrEnvelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            time_in_stage: 0.0,
            stage_start_level: 0.0,
            sample_rate,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
    }

    /// Set ADSR parameters. Times are floored at 1 ms so stage progress
    /// never divides by zero; sustain is clamped to [0, 1].
    pub fn set_parameters(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack = attack.max(0.001);
        self.decay = decay.max(0.001);
        self.sustain = sustain.clamp(0.0, 1.0);
        self.release = release.max(0.001);
    }

    /// Trigger (note on). Ramps up from the current level, so retriggering
    /// a sounding envelope does not snap to zero.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.time_in_stage = 0.0;
        self.stage_start_level = self.level;
    }

    /// Release (note off). Ramps down from wherever the level currently is.
    pub fn note_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
            self.time_in_stage = 0.0;
            self.stage_start_level = self.level;
        }
    }

    /// Force idle at level zero (hard voice cut)
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.time_in_stage = 0.0;
        self.stage_start_level = 0.0;
    }

    /// Advance one sample and return the current gain
    pub fn process(&mut self) -> f32 {
        let dt = 1.0 / self.sample_rate;

        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.time_in_stage += dt;
                if self.time_in_stage >= self.attack {
                    self.stage = EnvelopeStage::Decay;
                    self.time_in_stage = 0.0;
                    self.level = 1.0;
                    self.stage_start_level = 1.0;
                } else {
                    let progress = self.time_in_stage / self.attack;
                    self.level = self.stage_start_level + (1.0 - self.stage_start_level) * progress;
                }
            }
            EnvelopeStage::Decay => {
                self.time_in_stage += dt;
                if self.time_in_stage >= self.decay {
                    self.stage = EnvelopeStage::Sustain;
                    self.time_in_stage = 0.0;
                    self.level = self.sustain;
                } else {
                    let progress = self.time_in_stage / self.decay;
                    self.level = 1.0 + (self.sustain - 1.0) * progress;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain;
            }
            EnvelopeStage::Release => {
                self.time_in_stage += dt;
                if self.time_in_stage >= self.release {
                    self.stage = EnvelopeStage::Idle;
                    self.level = 0.0;
                } else {
                    let progress = self.time_in_stage / self.release;
                    self.level = self.stage_start_level * (1.0 - progress);
                }
            }
        }

        self.level
    }

    /// False only when idle; a released envelope stays active until its
    /// ramp reaches zero.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
