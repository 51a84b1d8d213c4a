// animation/tween.rs - Time-driven interpolation advanced by the external tick

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{lerp, Heading, PlaybackState, Vec3};

// ============================================================================
// EASING FUNCTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadInOut,
    CubicOut,
    SineInOut,
}

impl Easing {
    /// Apply easing function to normalized time value
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 { 2.0 * t * t } else { -1.0 + (4.0 - 2.0 * t) * t }
            }
            Easing::CubicOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            Easing::SineInOut => -(((std::f32::consts::PI * t).cos() - 1.0) / 2.0),
        }
    }
}

// ============================================================================
// INTERPOLATABLE TRAIT
// ============================================================================

pub trait Interpolate: Clone {
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        lerp(*self, *other, t)
    }
}

impl Interpolate for Vec3 {
    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for Heading {
    /// Rotates along the shorter arc, so 270 -> 0 passes through 315.
    #[inline]
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        let delta = self.shortest_delta(*other);
        Heading::new(self.degrees() + delta * t.clamp(0.0, 1.0))
    }
}

// ============================================================================
// TWEEN IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    start: T,
    end: T,
    current: T,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    state: PlaybackState,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(start: T, end: T, duration: Duration) -> Self {
        Self {
            start: start.clone(),
            end,
            current: start,
            duration,
            elapsed: Duration::ZERO,
            easing: Easing::Linear,
            state: PlaybackState::Playing,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Linear progress in `[0, 1]`, before easing.
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return if self.state == PlaybackState::Finished { 1.0 } else { 0.0 };
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Update tween and return true if still active
    pub fn update(&mut self, dt: Duration) -> bool {
        if self.state == PlaybackState::Finished {
            return false;
        }

        self.elapsed += dt;

        if self.elapsed >= self.duration {
            self.current = self.end.clone();
            self.state = PlaybackState::Finished;
            return false;
        }

        let t = self.easing.apply(self.progress());
        self.current = self.start.interpolate(&self.end, t);
        true
    }
}
