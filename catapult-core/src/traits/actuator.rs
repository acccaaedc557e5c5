//! Actuator driver trait
//!
//! Both the arm motor and the lock actuator are driven through this
//! interface. An actuator is commanded with a signed speed percentage,
//! either for a fixed time or until it stalls against a hard stop. A stall
//! is the only positional reference available: neither actuator has a
//! position sensor.

use core::fmt;

use crate::motion::CancelToken;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest speed magnitude, in percent of full speed
pub const MAX_SPEED: i16 = 100;

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Clockwise rotation
    #[default]
    Clockwise,
    /// Counter-clockwise rotation
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Signed actuator speed in percent of full speed
///
/// Positive values extend the lock actuator / draw the arm back; negative
/// values retract. Always within `-MAX_SPEED..=MAX_SPEED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Speed(i16);

impl Speed {
    /// Stopped
    pub const ZERO: Self = Self(0);
    /// Full speed in the positive direction
    pub const FULL_FORWARD: Self = Self(MAX_SPEED);
    /// Full speed in the negative direction
    pub const FULL_REVERSE: Self = Self(-MAX_SPEED);

    /// Create a speed, clamping to `-MAX_SPEED..=MAX_SPEED`
    pub const fn new(percent: i16) -> Self {
        let percent = if percent > MAX_SPEED {
            MAX_SPEED
        } else if percent < -MAX_SPEED {
            -MAX_SPEED
        } else {
            percent
        };
        Self(percent)
    }

    /// Positive speed with the given magnitude
    pub const fn forward(magnitude: u8) -> Self {
        Self::new(magnitude as i16)
    }

    /// Negative speed with the given magnitude
    pub const fn reverse(magnitude: u8) -> Self {
        Self::new(-(magnitude as i16))
    }

    /// Signed percentage
    pub const fn percent(self) -> i16 {
        self.0
    }

    /// Unsigned magnitude (0-100)
    pub const fn magnitude(self) -> u8 {
        self.0.unsigned_abs() as u8
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Direction of travel, `None` when stopped
    ///
    /// Positive speed maps to clockwise rotation.
    pub const fn direction(self) -> Option<Direction> {
        if self.0 > 0 {
            Some(Direction::Clockwise)
        } else if self.0 < 0 {
            Some(Direction::CounterClockwise)
        } else {
            None
        }
    }
}

/// Which of the two actuators an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorId {
    /// Motor drawing the throwing arm back
    Arm,
    /// Linear actuator locking the drive gear
    Lock,
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorId::Arm => f.write_str("arm actuator"),
            ActuatorId::Lock => f.write_str("lock actuator"),
        }
    }
}

/// Errors reported by actuator drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// No stall was detected within the allowed time
    Timeout,
    /// The motion was aborted through a [`CancelToken`]
    Cancelled,
    /// The underlying pin or PWM peripheral reported a failure
    Hardware,
    /// The actuator is not connected
    Disconnected,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorError::Timeout => f.write_str("no stall detected before timeout"),
            ActuatorError::Cancelled => f.write_str("motion cancelled"),
            ActuatorError::Hardware => f.write_str("hardware fault"),
            ActuatorError::Disconnected => f.write_str("actuator disconnected"),
        }
    }
}

/// Trait for a single motor or linear actuator
///
/// All motion commands leave the actuator at rest before returning, except
/// `run_time` with `wait == false`, which returns while the motion
/// continues.
pub trait Actuator {
    /// Run at `speed` for `duration_ms`
    ///
    /// With `wait` the call blocks until the duration has elapsed and the
    /// actuator has stopped. Without it the call returns immediately;
    /// [`speed`](Actuator::speed) reports zero once the run is over.
    fn run_time(&mut self, speed: Speed, duration_ms: u32, wait: bool)
        -> Result<(), ActuatorError>;

    /// Run at `speed` until the actuator stalls, then stop
    ///
    /// Gives up with [`ActuatorError::Timeout`] after `timeout_ms`, or with
    /// [`ActuatorError::Cancelled`] as soon as `cancel` fires. The actuator
    /// is stopped on every exit path.
    fn run_until_stalled(
        &mut self,
        speed: Speed,
        timeout_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), ActuatorError>;

    /// Halt immediately
    fn stop(&mut self) -> Result<(), ActuatorError>;

    /// Check whether the actuator is currently stalled
    fn is_stalled(&mut self) -> Result<bool, ActuatorError>;

    /// Current signed speed in percent; zero when at rest
    fn speed(&mut self) -> Result<i16, ActuatorError>;
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    fn run_time(
        &mut self,
        speed: Speed,
        duration_ms: u32,
        wait: bool,
    ) -> Result<(), ActuatorError> {
        T::run_time(self, speed, duration_ms, wait)
    }

    fn run_until_stalled(
        &mut self,
        speed: Speed,
        timeout_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), ActuatorError> {
        T::run_until_stalled(self, speed, timeout_ms, cancel)
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        T::stop(self)
    }

    fn is_stalled(&mut self) -> Result<bool, ActuatorError> {
        T::is_stalled(self)
    }

    fn speed(&mut self) -> Result<i16, ActuatorError> {
        T::speed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_clamps() {
        assert_eq!(Speed::new(250).percent(), 100);
        assert_eq!(Speed::new(-9000).percent(), -100);
        assert_eq!(Speed::new(42).percent(), 42);
    }

    #[test]
    fn test_speed_direction() {
        assert_eq!(Speed::FULL_FORWARD.direction(), Some(Direction::Clockwise));
        assert_eq!(
            Speed::FULL_REVERSE.direction(),
            Some(Direction::CounterClockwise)
        );
        assert_eq!(Speed::ZERO.direction(), None);
        assert_eq!(Speed::reverse(100), Speed::FULL_REVERSE);
        assert_eq!(Speed::FULL_REVERSE.magnitude(), 100);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Clockwise.opposite(), Direction::CounterClockwise);
        assert_eq!(Direction::CounterClockwise.opposite(), Direction::Clockwise);
    }
}
