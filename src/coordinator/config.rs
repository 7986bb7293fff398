//! Coordinator configuration.

/// Configuration of the global annealing schedule and its safety bounds.
///
/// All values are fixed for the lifetime of a run.
///
/// # Examples
///
/// ```
/// use u_distanneal::coordinator::CoordinatorConfig;
///
/// let config = CoordinatorConfig::default()
///     .with_initial_temperature(50.0)
///     .with_ratio(0.99)
///     .with_max_rounds(10_000)
///     .with_stall_rounds(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorConfig {
    /// Temperature before the first round. Round 1 runs at
    /// `initial_temperature * ratio`.
    pub initial_temperature: f64,

    /// Multiplicative decay applied once per round, in (0, 1).
    pub ratio: f64,

    /// Abort once this many rounds ran without convergence. `None` lets the
    /// loop run until the pending total reaches zero.
    pub max_rounds: Option<usize>,

    /// Abort when the pending total has not decreased for more than this
    /// many consecutive rounds. `None` disables the detector.
    pub stall_rounds: Option<usize>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 99.0,
            ratio: 0.999,
            max_rounds: Some(1_000_000),
            stall_rounds: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Removes the round bound.
    pub fn unbounded(mut self) -> Self {
        self.max_rounds = None;
        self
    }

    pub fn with_stall_rounds(mut self, rounds: usize) -> Self {
        self.stall_rounds = Some(rounds);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(format!(
                "initial_temperature must be positive and finite, got {}",
                self.initial_temperature
            ));
        }
        if self.ratio.is_nan() || self.ratio <= 0.0 || self.ratio >= 1.0 {
            return Err(format!("ratio must be in (0, 1), got {}", self.ratio));
        }
        if self.max_rounds == Some(0) {
            return Err("max_rounds must be at least 1".into());
        }
        if self.stall_rounds == Some(0) {
            return Err("stall_rounds must be at least 1".into());
        }
        Ok(())
    }
}
