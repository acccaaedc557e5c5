//! Catapult controller implementation
//!
//! Every operation is synchronous: it issues its motion commands in a fixed
//! order, blocks until the last one has finished, updates the safety state
//! and returns. Guarded operations report a rejection instead of silently
//! doing nothing, and blocking motions are bounded by timeouts and the
//! shared [`CancelToken`].
//!
//! # Usage
//!
//! ```ignore
//! static ESTOP: CancelToken = CancelToken::new();
//!
//! let mut catapult = Catapult::new(arm, lock, clock, &ESTOP, config)?;
//! catapult.reset()?;
//! catapult.safe_lock()?;
//! catapult.retract(80.0)?;
//! catapult.unlock()?; // fire
//! ```

use core::fmt;

use crate::config::{CatapultConfig, ConfigError};
use crate::motion::{
    execute_step, lock_step, release_sequence, reset_sequence, retract_duration_ms, unlock_step,
    CancelToken, MotionStep, Percent,
};
use crate::safety::{Event, FaultKind, SafetyState};
use crate::traits::{Actuator, ActuatorError, ActuatorId, Clock, Speed};

/// Result of an operation that did not fail
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The operation ran to completion
    Accepted,
    /// The mechanism is not in a safe state; nothing was moved
    RejectedPrecondition,
    /// The argument was out of range; nothing was moved
    RejectedInvalidInput,
}

impl Outcome {
    /// Check if the operation actually ran
    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

/// Errors that abort an operation midway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// An actuator command failed, timed out or was cancelled
    Actuator {
        actuator: ActuatorId,
        error: ActuatorError,
    },
    /// The arm was still moving well past its commanded run time
    RetractTimeout,
}

impl ControllerError {
    /// The fault this error leaves the controller in
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            ControllerError::Actuator { error, .. } => FaultKind::from(*error),
            ControllerError::RetractTimeout => FaultKind::RetractTimeout,
        }
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Actuator { actuator, error } => write!(f, "{}: {}", actuator, error),
            ControllerError::RetractTimeout => f.write_str("arm did not stop after retraction"),
        }
    }
}

/// Two-actuator catapult controller
///
/// Owns both actuators for its whole lifetime. Operations take `&mut self`,
/// so calls on one instance are serialized by construction; the only
/// cross-context handle is the cancel token.
pub struct Catapult<'a, A, L, C> {
    /// Motor drawing the throwing arm back
    arm: A,
    /// Linear actuator locking the drive gear
    lock: L,
    clock: C,
    cancel: &'a CancelToken,
    config: CatapultConfig,
    state: SafetyState,
    /// Last commanded arm position; `None` until the first calibration
    retract_percentage: Option<Percent>,
}

impl<'a, A, L, C> Catapult<'a, A, L, C>
where
    A: Actuator,
    L: Actuator,
    C: Clock,
{
    /// Create a controller from injected actuators
    ///
    /// The controller starts uncalibrated; call [`reset`](Self::reset)
    /// before anything else.
    pub fn new(
        arm: A,
        lock: L,
        clock: C,
        cancel: &'a CancelToken,
        config: CatapultConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Catapult created: arm on {}, lock on {}, full retraction {} s",
            config.ports.arm.index(),
            config.ports.lock.index(),
            config.retract_duration_s()
        );

        Ok(Self {
            arm,
            lock,
            clock,
            cancel,
            config,
            state: SafetyState::Uncalibrated,
            retract_percentage: None,
        })
    }

    /// Get the current safety state
    pub fn state(&self) -> SafetyState {
        self.state
    }

    /// Check if timed lock/unlock sequences are currently allowed
    pub fn is_safe(&self) -> bool {
        self.state.is_safe()
    }

    /// Last commanded retraction, `None` before the first calibration
    pub fn retract_percentage(&self) -> Option<Percent> {
        self.retract_percentage
    }

    /// Get the configuration
    pub fn config(&self) -> &CatapultConfig {
        &self.config
    }

    /// Get the cancel token shared with this controller
    pub fn cancel_token(&self) -> &'a CancelToken {
        self.cancel
    }

    /// Give back the actuators
    pub fn release(self) -> (A, L) {
        (self.arm, self.lock)
    }

    /// Calibrate the lock actuator
    ///
    /// Drives the lock through a fixed sequence that ends in a known park
    /// position regardless of where it started, then marks the mechanism
    /// safe with the arm at 0%. Runs unconditionally.
    pub fn reset(&mut self) -> Result<Outcome, ControllerError> {
        info!("Calibrating lock actuator");

        let steps = reset_sequence(self.config.full_speed, &self.config.timings);
        for step in steps {
            self.drive_lock(step)?;
        }

        self.retract_percentage = Some(Percent::ZERO);
        self.apply(Event::CalibrationComplete);
        info!("Calibration complete");

        Ok(Outcome::Accepted)
    }

    /// Engage the lock from the calibrated position
    ///
    /// Rejected unless the mechanism is safe. Leaves it safe.
    pub fn safe_lock(&mut self) -> Result<Outcome, ControllerError> {
        if !self.is_safe() {
            warn!("Lock refused: mechanism not in a safe state");
            return Ok(Outcome::RejectedPrecondition);
        }

        debug!("Engaging lock");
        self.drive_lock(lock_step(self.config.full_speed, &self.config.timings))?;

        Ok(Outcome::Accepted)
    }

    /// Disengage the lock by the inverse of [`safe_lock`](Self::safe_lock)
    ///
    /// Rejected unless the mechanism is safe. Leaves it safe.
    pub fn safe_unlock(&mut self) -> Result<Outcome, ControllerError> {
        if !self.is_safe() {
            warn!("Unlock refused: mechanism not in a safe state");
            return Ok(Outcome::RejectedPrecondition);
        }

        debug!("Disengaging lock");
        self.drive_lock(unlock_step(self.config.full_speed, &self.config.timings))?;

        Ok(Outcome::Accepted)
    }

    /// Force the lock open from any state
    ///
    /// Invalidates safety before moving, then stall-seeks the retracted
    /// hard stop repeatedly so that the final stall is the fully seated one.
    /// With the arm drawn back this releases the throw.
    pub fn unlock(&mut self) -> Result<Outcome, ControllerError> {
        self.apply(Event::LockReleased);
        info!("Releasing lock");

        for step in release_sequence(self.config.full_speed, &self.config.timings) {
            self.drive_lock(step)?;
        }

        Ok(Outcome::Accepted)
    }

    /// Draw the arm back to an absolute percentage of its span
    ///
    /// The run time is proportional to `percentage`. The motor is started
    /// without waiting, then polled until it either stalls or reports zero
    /// speed, at which point it is stopped. Values outside `0.0..=100.0`
    /// are rejected without touching any state.
    pub fn retract(&mut self, percentage: f32) -> Result<Outcome, ControllerError> {
        let Some(target) = Percent::new(percentage) else {
            warn!("Retraction to {}% refused: out of range", percentage);
            return Ok(Outcome::RejectedInvalidInput);
        };

        self.apply(Event::RetractStarted);

        let duration_ms = retract_duration_ms(self.config.retract_duration_s(), target);
        let speed = Speed::forward(self.config.retract_speed);
        info!("Retracting arm to {}% ({} ms)", target.value(), duration_ms);

        if self.cancel.is_cancelled() {
            return Err(self.fault(ActuatorId::Arm, ActuatorError::Cancelled));
        }
        self.on_arm(|arm| arm.run_time(speed, duration_ms, false))?;

        let deadline = self.clock.now_ms()
            + u64::from(duration_ms)
            + u64::from(self.config.retract_grace_ms);

        loop {
            if self.on_arm(|arm| arm.is_stalled())? {
                debug!("Arm stalled");
                break;
            }
            if self.on_arm(|arm| arm.speed())? == 0 {
                debug!("Arm run finished");
                break;
            }
            if self.cancel.is_cancelled() {
                return Err(self.fault(ActuatorId::Arm, ActuatorError::Cancelled));
            }
            if self.clock.now_ms() >= deadline {
                error!("Arm still moving {} ms past its run", self.config.retract_grace_ms);
                self.enter_fault(ActuatorId::Arm, FaultKind::RetractTimeout);
                return Err(ControllerError::RetractTimeout);
            }
        }

        self.on_arm(|arm| arm.stop())?;
        self.retract_percentage = Some(target);

        Ok(Outcome::Accepted)
    }

    /// Run one lock actuator step, honouring a pending cancellation
    fn drive_lock(&mut self, step: MotionStep) -> Result<(), ControllerError> {
        let result = if self.cancel.is_cancelled() {
            Err(ActuatorError::Cancelled)
        } else {
            execute_step(
                &mut self.lock,
                step,
                self.config.stall_timeout_ms,
                self.cancel,
            )
        };

        result.map_err(|error| self.fault(ActuatorId::Lock, error))
    }

    /// Run an arm actuator command, converting failures to faults
    fn on_arm<T>(
        &mut self,
        op: impl FnOnce(&mut A) -> Result<T, ActuatorError>,
    ) -> Result<T, ControllerError> {
        let result = op(&mut self.arm);
        result.map_err(|error| self.fault(ActuatorId::Arm, error))
    }

    /// Record a failed motion
    ///
    /// Stops the offending actuator, enters the fault state and consumes a
    /// pending cancellation so the next operation can run.
    fn fault(&mut self, actuator: ActuatorId, error: ActuatorError) -> ControllerError {
        error!("{} failed: {}", actuator, error);

        if error == ActuatorError::Cancelled {
            self.cancel.clear();
        }

        self.enter_fault(actuator, FaultKind::from(error));
        ControllerError::Actuator { actuator, error }
    }

    /// Stop the offending actuator and enter the fault state
    ///
    /// An arm fault also forgets the retraction, since the arm position is
    /// unknown afterwards.
    fn enter_fault(&mut self, actuator: ActuatorId, kind: FaultKind) {
        let stopped = match actuator {
            ActuatorId::Arm => self.arm.stop(),
            ActuatorId::Lock => self.lock.stop(),
        };
        if let Err(error) = stopped {
            error!("{} could not be stopped: {}", actuator, error);
        }

        if actuator == ActuatorId::Arm {
            self.retract_percentage = None;
        }

        self.apply(Event::FaultDetected(kind));
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            debug!("Safety state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}

impl<A, L, C> Catapult<'static, A, L, C>
where
    A: Actuator,
    L: Actuator,
    C: Clock,
{
    /// Create a controller with the default configuration and a
    /// process-wide cancel token
    ///
    /// Every controller built this way shares the same token: cancelling
    /// through one aborts all of them, and a fault in any of them consumes
    /// the pending cancellation. Use [`new`](Catapult::new) with a token of
    /// its own when several controllers run side by side.
    pub fn with_defaults(arm: A, lock: L, clock: C) -> Self {
        static DEFAULT_CANCEL: CancelToken = CancelToken::new();

        Self {
            arm,
            lock,
            clock,
            cancel: &DEFAULT_CANCEL,
            config: CatapultConfig::default(),
            state: SafetyState::Uncalibrated,
            retract_percentage: None,
        }
    }
}
