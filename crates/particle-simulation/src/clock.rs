//! Frame delta-time smoothing.
//!
//! Raw frame intervals are clamped, exponentially smoothed, snapped to a fixed
//! grid and only reported when they move by more than `epsilon`, so the
//! params uniform is rewritten only when the step actually changes.

/// Bounds and grid for the simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    pub min_dt: f32,
    pub max_dt: f32,
    pub quant_step: f32,
    /// Minimum change before a new dt is reported.
    pub epsilon: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            min_dt: 0.0001,
            max_dt: 0.0105,
            quant_step: 0.0001,
            epsilon: 0.00005,
        }
    }
}

impl ClockConfig {
    fn quantize(&self, dt: f32) -> f32 {
        let snapped = (dt / self.quant_step).round() * self.quant_step;
        snapped.clamp(self.min_dt, self.max_dt)
    }
}

#[derive(Debug)]
pub struct SimulationClock {
    config: ClockConfig,
    smoothing: f32,
    last_time: Option<f64>,
    smoothed: f32,
    dt: f32,
}

impl SimulationClock {
    pub fn new(config: ClockConfig, smoothing: f32) -> Self {
        Self {
            config,
            smoothing: smoothing.clamp(0.0, 1.0),
            last_time: None,
            smoothed: config.max_dt,
            dt: config.max_dt,
        }
    }

    /// Advance to `now` (seconds).
    ///
    /// Returns the new step only when it differs from the last reported one;
    /// the first tick after construction or `reset` just records the time.
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        let last = self.last_time.replace(now)?;

        let raw = ((now - last) as f32).clamp(self.config.min_dt, self.config.max_dt);
        self.smoothed += self.smoothing * (raw - self.smoothed);
        let dt = self.config.quantize(self.smoothed);

        if (dt - self.dt).abs() > self.config.epsilon {
            self.dt = dt;
            Some(dt)
        } else {
            None
        }
    }

    /// Forget the last timestamp so the next tick does not see the gap.
    ///
    /// The current step is kept.
    pub fn reset(&mut self) {
        self.last_time = None;
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn on_grid(dt: f32, step: f32) -> bool {
        let cells = dt / step;
        (cells - cells.round()).abs() < 1e-3
    }

    #[test]
    fn first_tick_only_records_time() {
        let mut clock = SimulationClock::new(ClockConfig::default(), 0.5);
        assert_eq!(clock.tick(10.0), None);
        assert_eq!(clock.dt(), ClockConfig::default().max_dt);
    }

    #[test]
    fn output_is_clamped_and_quantized() {
        let config = ClockConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut clock = SimulationClock::new(config, 0.3);

        let mut now = 0.0f64;
        clock.tick(now);
        for _ in 0..2000 {
            now += rng.random_range(0.0..0.05);
            if let Some(dt) = clock.tick(now) {
                assert!(dt >= config.min_dt && dt <= config.max_dt);
                assert!(on_grid(dt, config.quant_step), "{dt} is off grid");
            }
            assert!(clock.dt() >= config.min_dt && clock.dt() <= config.max_dt);
        }
    }

    #[test]
    fn steady_frames_settle_and_go_quiet() {
        let mut clock = SimulationClock::new(ClockConfig::default(), 0.5);
        let mut now = 0.0;
        clock.tick(now);

        let mut reports = 0;
        for _ in 0..200 {
            now += 0.004;
            if clock.tick(now).is_some() {
                reports += 1;
            }
        }
        assert!((clock.dt() - 0.004).abs() < 1e-4);
        assert!(reports < 20);

        for _ in 0..50 {
            now += 0.004;
            assert_eq!(clock.tick(now), None);
        }
    }

    #[test]
    fn long_gaps_are_capped() {
        let mut clock = SimulationClock::new(ClockConfig::default(), 1.0);
        clock.tick(0.0);
        clock.tick(0.002);
        let dt = clock.tick(5.0).unwrap();
        assert!((dt - 0.0105).abs() < 1e-6);
    }

    #[test]
    fn reset_hides_the_pause_gap() {
        let mut clock = SimulationClock::new(ClockConfig::default(), 1.0);
        clock.tick(0.0);
        clock.tick(0.002);
        let before = clock.dt();

        clock.reset();
        assert_eq!(clock.tick(100.0), None);
        assert_eq!(clock.tick(100.002), None);
        assert_eq!(clock.dt(), before);
    }
}
