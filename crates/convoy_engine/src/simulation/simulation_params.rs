use std::time::Duration;

/// Single trip customer screen.
pub const CUSTOMER_SIMULATION_DURATION: Duration = Duration::from_secs(10);

/// Multi trip operator screen.
pub const OPERATOR_SIMULATION_DURATION: Duration = Duration::from_secs(15);

/// Roughly one display refresh at 60Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    /// Wall clock time a replay takes, regardless of route length.
    pub duration: Duration,
    pub frame_interval: Duration,
}

impl SimulationParams {
    pub fn customer() -> Self {
        Self {
            duration: CUSTOMER_SIMULATION_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn operator() -> Self {
        Self {
            duration: OPERATOR_SIMULATION_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::customer()
    }
}

/// `min(elapsed / duration, 1)`, a zero duration is complete immediately.
pub fn progress_fraction(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }

    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
}
