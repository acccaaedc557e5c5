//! Simulated linear actuator
//!
//! Models an actuator travelling between two hard stops at a speed
//! proportional to the commanded percentage. Pushing against either stop
//! is reported as a stall, which is exactly the reference signal the
//! controller's calibration relies on.
//!
//! Time comes from a shared [`SimClock`]. Blocking calls advance the clock
//! themselves, and every status query costs a configurable slice of time,
//! so poll loops make progress without real sleeping.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use catapult_core::motion::CancelToken;
use catapult_core::traits::{Actuator, ActuatorError, Clock, Speed, MAX_SPEED};

/// Default simulated cost of one status query (ms)
pub const DEFAULT_POLL_COST_MS: u32 = 10;

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct SimClock {
    now_us: Cell<u64>,
}

impl SimClock {
    pub const fn new() -> Self {
        Self {
            now_us: Cell::new(0),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_us.get() / 1000
    }
}

/// Delay provider that advances a [`SimClock`] instead of sleeping
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl<'a> SimDelay<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_us(u64::from(ns).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ms(u64::from(ms));
    }
}

/// Simulated actuator between two hard stops
///
/// Position is in micrometres from the retracted stop (0) to `stroke_um`.
pub struct SimulatedActuator<'a> {
    clock: &'a SimClock,
    position_um: i64,
    stroke_um: i64,
    /// Travel rate at full speed
    rate_um_per_s: i64,
    speed: Speed,
    /// Deadline of a non-blocking timed run
    run_until: Option<u64>,
    /// Time up to which motion has been integrated
    settled_at: u64,
    connected: bool,
    poll_cost_ms: u32,
}

impl<'a> SimulatedActuator<'a> {
    /// Create an actuator resting on its retracted stop
    pub fn new(clock: &'a SimClock, stroke_um: u32, rate_um_per_s: u32) -> Self {
        Self {
            clock,
            position_um: 0,
            stroke_um: i64::from(stroke_um),
            rate_um_per_s: i64::from(rate_um_per_s),
            speed: Speed::ZERO,
            run_until: None,
            settled_at: clock.now_ms(),
            connected: true,
            poll_cost_ms: DEFAULT_POLL_COST_MS,
        }
    }

    /// Start from the given position (clamped to the stroke)
    pub fn at_position(mut self, position_um: u32) -> Self {
        self.position_um = i64::from(position_um).min(self.stroke_um);
        self
    }

    /// Set the simulated cost of one status query
    pub fn with_poll_cost(mut self, poll_cost_ms: u32) -> Self {
        self.poll_cost_ms = poll_cost_ms;
        self
    }

    /// Simulate a disconnected cable: commands are accepted but nothing
    /// moves and no stall is ever reported
    pub fn disconnect(&mut self) {
        self.settle();
        self.connected = false;
    }

    /// Current position in micrometres
    pub fn position_um(&mut self) -> i64 {
        self.settle();
        self.position_um
    }

    /// Total travel between the hard stops
    pub fn stroke_um(&self) -> i64 {
        self.stroke_um
    }

    /// Integrate motion up to the current time
    fn settle(&mut self) {
        let now = self.clock.now_ms();
        let end = match self.run_until {
            Some(deadline) if deadline < now => deadline,
            _ => now,
        };

        if self.connected && end > self.settled_at {
            let dt_ms = (end - self.settled_at) as i64;
            let delta = self.rate_um_per_s * i64::from(self.speed.percent()) * dt_ms
                / (i64::from(MAX_SPEED) * 1000);
            self.position_um = (self.position_um + delta).clamp(0, self.stroke_um);
        }
        self.settled_at = now;

        if matches!(self.run_until, Some(deadline) if deadline <= now) {
            self.speed = Speed::ZERO;
            self.run_until = None;
        }
    }

    /// Check if the actuator is being driven into one of its stops
    fn pushing_into_stop(&self) -> bool {
        if !self.connected {
            return false;
        }
        let speed = self.speed.percent();
        (speed < 0 && self.position_um <= 0) || (speed > 0 && self.position_um >= self.stroke_um)
    }

    /// Time until the current motion reaches its stop, if it ever does
    fn time_to_stop_ms(&self) -> Option<u64> {
        if !self.connected || self.speed.is_zero() {
            return None;
        }

        let distance = if self.speed.percent() < 0 {
            self.position_um
        } else {
            self.stroke_um - self.position_um
        };
        let velocity = self.rate_um_per_s * i64::from(self.speed.magnitude()) / i64::from(MAX_SPEED);
        if velocity <= 0 {
            return None;
        }

        // Round up so the integrated motion always reaches the stop
        Some(((distance * 1000 + velocity - 1) / velocity) as u64)
    }

    fn poll(&mut self) {
        self.clock.advance_ms(u64::from(self.poll_cost_ms));
        self.settle();
    }
}

impl Actuator for SimulatedActuator<'_> {
    fn run_time(
        &mut self,
        speed: Speed,
        duration_ms: u32,
        wait: bool,
    ) -> Result<(), ActuatorError> {
        self.settle();
        self.speed = speed;
        self.run_until = Some(self.clock.now_ms() + u64::from(duration_ms));

        if wait {
            self.clock.advance_ms(u64::from(duration_ms));
            self.settle();
        }

        Ok(())
    }

    /// Jumps the clock straight to the stall (or the timeout); the cancel
    /// token is therefore only honoured before the motion starts.
    fn run_until_stalled(
        &mut self,
        speed: Speed,
        timeout_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), ActuatorError> {
        self.settle();
        if cancel.is_cancelled() {
            return Err(ActuatorError::Cancelled);
        }

        self.speed = speed;
        self.run_until = None;

        let result = match self.time_to_stop_ms() {
            Some(ms) if ms <= u64::from(timeout_ms) => {
                self.clock.advance_ms(ms);
                Ok(())
            }
            _ => {
                self.clock.advance_ms(u64::from(timeout_ms));
                Err(ActuatorError::Timeout)
            }
        };

        self.stop()?;
        result
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        self.settle();
        self.speed = Speed::ZERO;
        self.run_until = None;
        Ok(())
    }

    fn is_stalled(&mut self) -> Result<bool, ActuatorError> {
        self.poll();
        Ok(self.pushing_into_stop())
    }

    fn speed(&mut self) -> Result<i16, ActuatorError> {
        self.poll();
        Ok(self.speed.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use catapult_core::config::CatapultConfig;
    use catapult_core::controller::{Catapult, ControllerError, Outcome};
    use catapult_core::motion::Percent;
    use catapult_core::safety::{FaultKind, SafetyState};
    use catapult_core::traits::ActuatorId;

    /// 40 mm stroke, full stroke in 2 s
    fn lock_actuator(clock: &SimClock) -> SimulatedActuator<'_> {
        SimulatedActuator::new(clock, 40_000, 20_000)
    }

    /// 47 mm of travel at 1 mm/s: full span in 47 s
    fn arm_motor(clock: &SimClock) -> SimulatedActuator<'_> {
        SimulatedActuator::new(clock, 47_000, 1_000)
    }

    #[test]
    fn test_timed_run_moves_proportionally() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock);

        actuator.run_time(Speed::FULL_FORWARD, 500, true).unwrap();
        assert_eq!(actuator.position_um(), 10_000);

        actuator.run_time(Speed::new(-50), 500, true).unwrap();
        assert_eq!(actuator.position_um(), 5_000);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_non_blocking_run_ends_at_deadline() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock);

        actuator.run_time(Speed::FULL_FORWARD, 100, false).unwrap();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(actuator.speed().unwrap(), 100);

        clock.advance_ms(500);
        assert_eq!(actuator.speed().unwrap(), 0);
        // Motion stopped at the deadline, not when it was noticed
        assert_eq!(actuator.position_um(), 2_000);
    }

    #[test]
    fn test_stall_at_hard_stop() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock).at_position(30_000);
        let cancel = CancelToken::new();

        actuator
            .run_until_stalled(Speed::FULL_REVERSE, 5000, &cancel)
            .unwrap();

        assert_eq!(actuator.position_um(), 0);
        assert_eq!(clock.now_ms(), 1500);
        assert_eq!(actuator.speed().unwrap(), 0);
    }

    #[test]
    fn test_timed_run_into_stop_reports_stall() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock).at_position(39_000);

        actuator.run_time(Speed::FULL_FORWARD, 1000, false).unwrap();

        // 1 mm at 20 mm/s is 50 ms; each poll costs 10 ms
        for _ in 0..4 {
            assert!(!actuator.is_stalled().unwrap());
        }
        assert_eq!(actuator.position_um(), 39_800);

        assert!(actuator.is_stalled().unwrap());
        assert_eq!(clock.now_ms(), 50);
        assert_eq!(actuator.position_um(), 40_000);
    }

    #[test]
    fn test_disconnected_times_out() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock).at_position(20_000);
        let cancel = CancelToken::new();
        actuator.disconnect();

        assert_eq!(
            actuator.run_until_stalled(Speed::FULL_REVERSE, 3000, &cancel),
            Err(ActuatorError::Timeout)
        );
        assert_eq!(clock.now_ms(), 3000);
        assert_eq!(actuator.position_um(), 20_000);
    }

    #[test]
    fn test_cancelled_before_start() {
        let clock = SimClock::new();
        let mut actuator = lock_actuator(&clock).at_position(20_000);
        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(
            actuator.run_until_stalled(Speed::FULL_REVERSE, 3000, &cancel),
            Err(ActuatorError::Cancelled)
        );
        assert_eq!(actuator.position_um(), 20_000);
    }

    #[test]
    fn test_delay_advances_clock() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);

        delay.delay_ms(5);
        delay.delay_us(2500);
        delay.delay_ns(500_000);
        assert_eq!(clock.now_ms(), 8);
    }

    #[test]
    fn test_catapult_calibrate_lock_unlock() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let mut catapult = Catapult::new(
            arm_motor(&clock),
            lock_actuator(&clock).at_position(12_345),
            &clock,
            &cancel,
            CatapultConfig::default(),
        )
        .unwrap();

        assert_eq!(catapult.reset(), Ok(Outcome::Accepted));
        let (arm, mut lock) = catapult.release();
        // Seated, extended 1500 ms, seated, extended 900 ms
        assert_eq!(lock.position_um(), 18_000);

        let mut catapult =
            Catapult::new(arm, lock, &clock, &cancel, CatapultConfig::default()).unwrap();
        assert_eq!(catapult.reset(), Ok(Outcome::Accepted));
        assert_eq!(catapult.safe_lock(), Ok(Outcome::Accepted));
        assert_eq!(catapult.safe_unlock(), Ok(Outcome::Accepted));
        assert!(catapult.is_safe());

        let (_, mut lock) = catapult.release();
        // 18 mm + 650 ms forward - 570 ms back
        assert_eq!(lock.position_um(), 19_600);
    }

    #[test]
    fn test_catapult_retract_and_release() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let mut catapult = Catapult::new(
            arm_motor(&clock),
            lock_actuator(&clock),
            &clock,
            &cancel,
            CatapultConfig::default(),
        )
        .unwrap();

        assert_eq!(catapult.reset(), Ok(Outcome::Accepted));
        assert_eq!(catapult.safe_lock(), Ok(Outcome::Accepted));

        let start = clock.now_ms();
        assert_eq!(catapult.retract(50.0), Ok(Outcome::Accepted));
        assert!(clock.now_ms() - start >= 23_500);
        assert_eq!(catapult.retract_percentage(), Percent::new(50.0));
        assert!(!catapult.is_safe());

        assert_eq!(catapult.unlock(), Ok(Outcome::Accepted));
        assert_eq!(catapult.state(), SafetyState::Released);

        let (mut arm, mut lock) = catapult.release();
        assert_eq!(arm.position_um(), 23_500);
        assert_eq!(arm.speed().unwrap(), 0);
        assert_eq!(lock.position_um(), 0);
    }

    #[test]
    fn test_catapult_retract_blocked_arm() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        // Arm can only travel 20 mm before it is blocked
        let arm = SimulatedActuator::new(&clock, 20_000, 1_000);
        let mut catapult = Catapult::new(
            arm,
            lock_actuator(&clock),
            &clock,
            &cancel,
            CatapultConfig::default(),
        )
        .unwrap();

        assert_eq!(catapult.reset(), Ok(Outcome::Accepted));

        let start = clock.now_ms();
        assert_eq!(catapult.retract(100.0), Ok(Outcome::Accepted));
        let elapsed = clock.now_ms() - start;

        // Stopped on the stall, well before the nominal 47 s
        assert!(elapsed >= 20_000);
        assert!(elapsed < 21_000);

        let (mut arm, _) = catapult.release();
        assert_eq!(arm.position_um(), 20_000);
        assert_eq!(arm.speed().unwrap(), 0);
    }

    #[test]
    fn test_catapult_reset_disconnected_lock() {
        let clock = SimClock::new();
        let cancel = CancelToken::new();
        let mut lock = lock_actuator(&clock).at_position(10_000);
        lock.disconnect();

        let config = CatapultConfig {
            stall_timeout_ms: 4000,
            ..CatapultConfig::default()
        };
        let mut catapult =
            Catapult::new(arm_motor(&clock), lock, &clock, &cancel, config).unwrap();

        assert_eq!(
            catapult.reset(),
            Err(ControllerError::Actuator {
                actuator: ActuatorId::Lock,
                error: ActuatorError::Timeout
            })
        );
        assert_eq!(clock.now_ms(), 4000);
        assert_eq!(catapult.state(), SafetyState::Fault(FaultKind::StallTimeout));
        assert_eq!(catapult.safe_lock(), Ok(Outcome::RejectedPrecondition));
    }
}
