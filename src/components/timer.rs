//! Countdown primitive shared by sensors, actuators and the damage protocol.
//!
//! A [`Timer`] only advances while running. Reaching the duration stops it but
//! keeps `elapsed` where it landed; the owner decides when to [`Timer::start`]
//! again or [`Timer::reset`] it.

/// Countdown timer driven by explicit frame deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    duration: f32,
    elapsed: f32,
    running: bool,
}

impl Timer {
    /// Create a stopped timer. Negative durations are clamped to zero.
    pub fn new(duration: f32) -> Self {
        Timer {
            duration: duration.max(0.0),
            elapsed: 0.0,
            running: false,
        }
    }

    /// Restart counting from zero.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Stop and rewind to zero.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }

    /// Advance by `dt` seconds if running. Stops once `elapsed >= duration`.
    pub fn update(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            self.running = false;
        }
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `max(0, duration - elapsed)`.
    pub fn time_remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// True once the countdown has been consumed.
    pub fn is_finished(&self) -> bool {
        self.time_remaining() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn new_timer_is_stopped_and_full() {
        let timer = Timer::new(2.0);
        assert!(!timer.is_running());
        assert!(approx_eq(timer.time_remaining(), 2.0));
    }

    #[test]
    fn negative_duration_is_clamped() {
        let timer = Timer::new(-3.0);
        assert!(approx_eq(timer.duration(), 0.0));
        assert!(timer.is_finished());
    }

    #[test]
    fn stopped_timer_does_not_advance() {
        let mut timer = Timer::new(1.0);
        timer.update(0.5);
        assert!(approx_eq(timer.elapsed(), 0.0));
    }

    #[test]
    fn reaching_duration_stops_without_reset() {
        let mut timer = Timer::new(1.0);
        timer.start();
        timer.update(0.75);
        assert!(timer.is_running());
        timer.update(0.5);
        assert!(!timer.is_running());
        assert!(approx_eq(timer.elapsed(), 1.25));
        assert!(approx_eq(timer.time_remaining(), 0.0));

        // frozen once stopped
        timer.update(10.0);
        assert!(approx_eq(timer.elapsed(), 1.25));
    }

    #[test]
    fn reset_rewinds_and_stops() {
        let mut timer = Timer::new(1.0);
        timer.start();
        timer.update(0.4);
        timer.reset();
        assert!(!timer.is_running());
        assert!(approx_eq(timer.time_remaining(), 1.0));
    }
}
