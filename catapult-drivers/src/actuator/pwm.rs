//! PWM H-bridge actuator driver
//!
//! Drives a brushed DC motor or linear actuator through a PWM channel for
//! speed and a GPIO for direction. Stall detection comes from the bridge's
//! DIAG (overcurrent) output, debounced so that inrush current at start-up
//! is not mistaken for a stall.
//!
//! # Usage
//!
//! ```ignore
//! let mut arm = PwmActuator::new(pwm, dir_pin, diag_pin, delay, clock, config)?;
//! arm.run_time(Speed::forward(100), 2000, false)?;
//! while !arm.is_stalled()? && arm.speed()? != 0 {}
//! arm.stop()?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use catapult_core::motion::CancelToken;
use catapult_core::traits::{Actuator, ActuatorError, Clock, Direction, Speed};

/// PWM actuator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmActuatorConfig {
    /// Minimum duty cycle percentage (below this the actuator won't move)
    pub min_duty: u8,
    /// Rotation produced by a positive speed
    pub positive_direction: Direction,
    /// DIAG pin level that signals overcurrent
    pub diag_active_high: bool,
    /// How long DIAG must stay asserted before it counts as a stall (ms)
    pub stall_debounce_ms: u32,
    /// Poll interval while waiting for a stall (ms)
    pub poll_interval_ms: u32,
}

impl Default for PwmActuatorConfig {
    fn default() -> Self {
        Self {
            min_duty: 20,
            positive_direction: Direction::Clockwise,
            diag_active_high: true,
            stall_debounce_ms: 50,
            poll_interval_ms: 5,
        }
    }
}

/// Actuator on a PWM H-bridge
pub struct PwmActuator<P, D, S, T, C> {
    config: PwmActuatorConfig,
    pwm: P,
    dir: D,
    diag: S,
    delay: T,
    clock: C,
    /// Commanded speed
    speed: Speed,
    /// Rotation currently selected on the direction pin
    rotation: Option<Direction>,
    /// Deadline of a non-blocking timed run
    run_until: Option<u64>,
    /// When DIAG was first seen asserted
    stall_since: Option<u64>,
}

impl<P, D, S, T, C> PwmActuator<P, D, S, T, C>
where
    P: SetDutyCycle,
    D: OutputPin,
    S: InputPin,
    T: DelayNs,
    C: Clock,
{
    /// Create a new driver with the output switched off
    pub fn new(
        pwm: P,
        dir: D,
        diag: S,
        delay: T,
        clock: C,
        config: PwmActuatorConfig,
    ) -> Result<Self, ActuatorError> {
        let mut actuator = Self {
            config,
            pwm,
            dir,
            diag,
            delay,
            clock,
            speed: Speed::ZERO,
            rotation: None,
            run_until: None,
            stall_since: None,
        };
        actuator.halt()?;
        Ok(actuator)
    }

    /// Get the configuration
    pub fn config(&self) -> &PwmActuatorConfig {
        &self.config
    }

    /// Give back the peripherals
    pub fn release(self) -> (P, D, S, T, C) {
        (self.pwm, self.dir, self.diag, self.delay, self.clock)
    }

    /// Scale the speed magnitude to actual duty cycle
    ///
    /// Maps 1-100% to min_duty-100%; 0% stays off.
    fn scale_duty(&self, magnitude: u8) -> u8 {
        if magnitude == 0 {
            0
        } else {
            let min = self.config.min_duty.min(100) as u32;
            let range = 100 - min;
            let scaled = min + (magnitude as u32 * range / 100);
            scaled.min(100) as u8
        }
    }

    /// Apply a speed to the bridge
    fn drive(&mut self, speed: Speed) -> Result<(), ActuatorError> {
        let Some(direction) = speed.direction() else {
            return self.halt();
        };

        let rotation = match self.config.positive_direction {
            Direction::Clockwise => direction,
            Direction::CounterClockwise => direction.opposite(),
        };

        if self.rotation != Some(rotation) {
            // Never flip the bridge while it is driving
            self.pwm
                .set_duty_cycle_fully_off()
                .map_err(|_| ActuatorError::Hardware)?;
            match rotation {
                Direction::Clockwise => self.dir.set_high(),
                Direction::CounterClockwise => self.dir.set_low(),
            }
            .map_err(|_| ActuatorError::Hardware)?;
            self.rotation = Some(rotation);
        }

        let duty = self.scale_duty(speed.magnitude());
        self.pwm
            .set_duty_cycle_percent(duty)
            .map_err(|_| ActuatorError::Hardware)?;

        trace!("Drive {}% (duty {}%)", speed.percent(), duty);
        self.speed = speed;
        self.run_until = None;
        self.stall_since = None;
        Ok(())
    }

    /// Switch the output off
    fn halt(&mut self) -> Result<(), ActuatorError> {
        self.speed = Speed::ZERO;
        self.run_until = None;
        self.stall_since = None;
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::Hardware)
    }

    /// End a non-blocking timed run once its deadline has passed
    fn expire_run(&mut self) -> Result<(), ActuatorError> {
        if let Some(deadline) = self.run_until {
            if self.clock.now_ms() >= deadline {
                trace!("Timed run finished");
                self.halt()?;
            }
        }
        Ok(())
    }

    fn diag_asserted(&mut self) -> Result<bool, ActuatorError> {
        let high = self.diag.is_high().map_err(|_| ActuatorError::Hardware)?;
        Ok(high == self.config.diag_active_high)
    }

    /// Sample DIAG and apply the debounce
    fn poll_stall(&mut self) -> Result<bool, ActuatorError> {
        if self.speed.is_zero() || !self.diag_asserted()? {
            self.stall_since = None;
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let since = *self.stall_since.get_or_insert(now);
        Ok(self.clock.elapsed_ms(since) >= u64::from(self.config.stall_debounce_ms))
    }

    fn wait_for_stall(
        &mut self,
        timeout_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), ActuatorError> {
        let start = self.clock.now_ms();

        loop {
            if self.poll_stall()? {
                debug!("Stalled after {} ms", self.clock.elapsed_ms(start));
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(ActuatorError::Cancelled);
            }
            if self.clock.elapsed_ms(start) >= u64::from(timeout_ms) {
                warn!("No stall within {} ms", timeout_ms);
                return Err(ActuatorError::Timeout);
            }
            self.delay.delay_ms(self.config.poll_interval_ms);
        }
    }
}

impl<P, D, S, T, C> Actuator for PwmActuator<P, D, S, T, C>
where
    P: SetDutyCycle,
    D: OutputPin,
    S: InputPin,
    T: DelayNs,
    C: Clock,
{
    fn run_time(
        &mut self,
        speed: Speed,
        duration_ms: u32,
        wait: bool,
    ) -> Result<(), ActuatorError> {
        if speed.is_zero() || duration_ms == 0 {
            return self.halt();
        }

        self.drive(speed)?;

        if wait {
            self.delay.delay_ms(duration_ms);
            self.halt()
        } else {
            self.run_until = Some(self.clock.now_ms() + u64::from(duration_ms));
            Ok(())
        }
    }

    fn run_until_stalled(
        &mut self,
        speed: Speed,
        timeout_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), ActuatorError> {
        if cancel.is_cancelled() {
            return Err(ActuatorError::Cancelled);
        }

        self.drive(speed)?;
        let result = self.wait_for_stall(timeout_ms, cancel);
        let halted = self.halt();

        result.and(halted)
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        self.halt()
    }

    fn is_stalled(&mut self) -> Result<bool, ActuatorError> {
        self.expire_run()?;
        self.poll_stall()
    }

    fn speed(&mut self) -> Result<i16, ActuatorError> {
        self.expire_run()?;
        Ok(self.speed.percent())
    }
}
