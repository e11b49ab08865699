//! Physical constants and per-step parameters.

use super::SolverError;

/// Recommended time step of a freshly created scene.
pub const RECOMMENDED_TIME_STEP: f64 = 0.03;

/// Process-wide physical constants.
///
/// Set once per scene and copied into every calculator at `init`; never
/// mutated during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalParameters {
    /// Floor for the height used as velocity-update denominator.
    pub h_min: f64,
    /// Gravitational acceleration.
    pub gravity: f64,
    /// Bottom friction coefficient.
    pub cf: f64,
    /// Velocities with smaller magnitude are snapped to zero.
    pub min_non_zero_speed: f64,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            h_min: 0.05,
            gravity: 10.0,
            cf: 0.15,
            min_non_zero_speed: 0.003,
        }
    }
}

impl GlobalParameters {
    /// Create parameters with explicit values.
    ///
    /// # Arguments
    /// * `h_min` - Height floor for the velocity update (typically 0.01 - 0.1)
    /// * `gravity` - Gravitational acceleration
    /// * `cf` - Bottom friction coefficient (0 disables friction)
    /// * `min_non_zero_speed` - Speed snapping threshold
    pub fn new(h_min: f64, gravity: f64, cf: f64, min_non_zero_speed: f64) -> Self {
        Self {
            h_min,
            gravity,
            cf,
            min_non_zero_speed,
        }
    }

    pub fn with_h_min(mut self, h_min: f64) -> Self {
        self.h_min = h_min;
        self
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the bottom friction coefficient.
    pub fn with_friction(mut self, cf: f64) -> Self {
        self.cf = cf;
        self
    }

    pub fn with_min_non_zero_speed(mut self, speed: f64) -> Self {
        self.min_non_zero_speed = speed;
        self
    }

    /// Half the gravitational acceleration, used by the bed-slope term.
    #[inline]
    pub fn half_gravity(&self) -> f64 {
        0.5 * self.gravity
    }

    /// Check that every constant is finite and physically meaningful.
    pub fn validate(&self) -> Result<(), SolverError> {
        let all_finite = [self.h_min, self.gravity, self.cf, self.min_non_zero_speed]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(SolverError::InvalidParameter(format!(
                "non-finite global parameter in {self:?}"
            )));
        }
        if self.gravity <= 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        if self.h_min < 0.0 || self.cf < 0.0 || self.min_non_zero_speed < 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "h_min, cf and min_non_zero_speed must be non-negative, got {self:?}"
            )));
        }
        Ok(())
    }
}

/// Time and time step of one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalculatorPars {
    /// Simulation time at the start of the step.
    pub time: f64,
    /// Time step.
    pub tau: f64,
}

impl CalculatorPars {
    /// Create step parameters; `tau` must be positive and finite.
    pub fn new(time: f64, tau: f64) -> Result<Self, SolverError> {
        if !(tau > 0.0) || !tau.is_finite() {
            return Err(SolverError::InvalidTimeStep(tau));
        }
        Ok(Self { time, tau })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let g = GlobalParameters::default();
        assert!(g.validate().is_ok());
        assert_eq!(g.half_gravity(), 5.0);
    }

    #[test]
    fn test_invalid_globals_rejected() {
        assert!(GlobalParameters::default().with_gravity(0.0).validate().is_err());
        assert!(GlobalParameters::default().with_friction(-1.0).validate().is_err());
        assert!(GlobalParameters::default().with_h_min(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_degenerate_tau_rejected() {
        assert!(CalculatorPars::new(0.0, 0.01).is_ok());
        assert_eq!(
            CalculatorPars::new(0.0, 0.0),
            Err(SolverError::InvalidTimeStep(0.0))
        );
        assert!(CalculatorPars::new(0.0, -0.1).is_err());
        assert!(CalculatorPars::new(0.0, f64::INFINITY).is_err());
        assert!(CalculatorPars::new(0.0, f64::NAN).is_err());
    }
}
