//! Arm retraction timing
//!
//! The arm has no position sensor. Its position is estimated open-loop:
//! at full speed the motor needs a fixed, calibrated time to draw the arm
//! across its whole span, so a target percentage maps linearly onto a run
//! duration.

/// Retraction percentage, always within `0.0..=100.0`
///
/// 100% corresponds to the arm pressed against the base plate with the
/// launch string fully tensioned.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Percent(f32);

impl Percent {
    /// Arm fully released
    pub const ZERO: Self = Self(0.0);
    /// Arm fully drawn back
    pub const FULL: Self = Self(100.0);

    /// Validate a percentage
    ///
    /// Returns `None` for values outside `0.0..=100.0` and for NaN.
    pub fn new(value: f32) -> Option<Self> {
        if (0.0..=100.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the raw value
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Run duration needed to reach `target`
///
/// `full_span_s * 1000 * target / 100`, rounded to the nearest millisecond.
pub fn retract_duration_ms(full_span_s: u16, target: Percent) -> u32 {
    // s * 1000 / 100 == s * 10; f64 holds every product exactly
    let ms = f64::from(full_span_s) * 10.0 * f64::from(target.value());
    (ms + 0.5) as u32
}
