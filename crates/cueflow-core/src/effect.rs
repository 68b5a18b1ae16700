//! Velocity effects.
//!
//! Effects only reshape note-on velocity; they never create or drop notes.

use std::fmt;
use std::sync::Arc;

pub trait Effect: Send + Sync {
    fn name(&self) -> &str {
        "effect"
    }

    /// Maps `velocity` for `note`. The result may leave 0-127; the chain clamps.
    fn process(&self, note: u8, velocity: i32) -> i32;
}

/// Ordered list of effects applied one after another.
#[derive(Clone, Default)]
pub struct EffectChain {
    effects: Vec<Arc<dyn Effect>>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Arc<dyn Effect>) {
        self.effects.push(effect);
    }

    pub fn with(mut self, effect: impl Effect + 'static) -> Self {
        self.push(Arc::new(effect));
        self
    }

    /// Appends every effect of `other`.
    pub fn extend(&mut self, other: &EffectChain) {
        self.effects.extend(other.effects.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Runs every effect in order without clamping, so chains can be
    /// composed before the final [`process`](Self::process).
    pub fn process_raw(&self, note: u8, velocity: i32) -> i32 {
        self.effects
            .iter()
            .fold(velocity, |v, effect| effect.process(note, v))
    }

    /// Runs every effect in order and clamps the result to 0-127.
    pub fn process(&self, note: u8, velocity: i32) -> u8 {
        self.process_raw(note, velocity).clamp(0, 127) as u8
    }
}

impl fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.effects.iter().map(|e| e.name()))
            .finish()
    }
}

impl<E: Effect + 'static> From<E> for EffectChain {
    fn from(effect: E) -> Self {
        EffectChain::new().with(effect)
    }
}

/// Multiplies velocity by a constant factor.
#[derive(Debug, Clone, Copy)]
pub struct VelocityScale(pub f32);

impl Effect for VelocityScale {
    fn name(&self) -> &str {
        "velocity-scale"
    }

    fn process(&self, _note: u8, velocity: i32) -> i32 {
        (velocity as f32 * self.0).round() as i32
    }
}

/// Replaces every velocity with a constant.
#[derive(Debug, Clone, Copy)]
pub struct FixedVelocity(pub u8);

impl Effect for FixedVelocity {
    fn name(&self) -> &str {
        "fixed-velocity"
    }

    fn process(&self, _note: u8, _velocity: i32) -> i32 {
        self.0 as i32
    }
}

/// Power curve over the velocity range. `exponent < 1` makes soft playing
/// louder, `exponent > 1` makes it quieter.
#[derive(Debug, Clone, Copy)]
pub struct VelocityCurve {
    pub exponent: f32,
}

impl Effect for VelocityCurve {
    fn name(&self) -> &str {
        "velocity-curve"
    }

    fn process(&self, _note: u8, velocity: i32) -> i32 {
        let normalized = (velocity.clamp(0, 127) as f32) / 127.0;
        (normalized.powf(self.exponent) * 127.0).round() as i32
    }
}
