//! Ramp controller: acceleration-bounded actuation.
//!
//! Bounds how fast the step output may change per tick and owns the driver
//! enable line. Two interchangeable strategies sit behind [`RampController`]:
//!
//! - per-wheel: four independent channels each ramp toward their target
//! - shared frequency: one scalar step frequency ramps (faster down than
//!   up), wheel directions switch instantly
//!
//! Both guarantee the per-tick change bound, snap to exactly zero inside the
//! dead-band (disabling the drivers), and hold output for a settle delay
//! after the drivers are re-enabled.

use matebot_core::config::{RampConfig, RampStrategyKind};
use matebot_core::types::WheelRates;

use crate::backend::DriveOutput;

/// A ramping strategy: turns targets into rate-limited channel outputs.
trait RampStrategy: Send {
    /// Set the target rates for subsequent ticks.
    fn set_target(&mut self, rates: &WheelRates, freq_override: Option<f32>);

    /// Advance the ramp by `dt` seconds and return the channel outputs.
    fn advance(&mut self, dt: f32) -> [f32; 4];

    /// Largest magnitude currently being targeted.
    fn target_peak(&self) -> f32;

    /// Snap all output to zero immediately.
    fn halt(&mut self);
}

/// Four independent channels, symmetric acceleration bound.
struct PerWheelRamp {
    current: [f32; 4],
    target: [f32; 4],
    accel_limit: f32,
}

impl PerWheelRamp {
    fn new(config: &RampConfig) -> Self {
        Self {
            current: [0.0; 4],
            target: [0.0; 4],
            accel_limit: config.accel_limit,
        }
    }
}

impl RampStrategy for PerWheelRamp {
    fn set_target(&mut self, rates: &WheelRates, _freq_override: Option<f32>) {
        self.target = rates.as_array();
    }

    fn advance(&mut self, dt: f32) -> [f32; 4] {
        let step = self.accel_limit * dt;
        for (current, target) in self.current.iter_mut().zip(self.target) {
            let diff = target - *current;
            *current += diff.clamp(-step, step);
        }
        self.current
    }

    fn target_peak(&self) -> f32 {
        self.target.iter().fold(0.0_f32, |acc, t| acc.max(t.abs()))
    }

    fn halt(&mut self) {
        self.current = [0.0; 4];
        self.target = [0.0; 4];
    }
}

/// One shared step frequency; per-wheel directions are instantaneous.
///
/// Deceleration is steeper than acceleration so a command loss stops the
/// chassis quickly.
struct FrequencyRamp {
    current_freq: f32,
    target_freq: f32,
    directions: [f32; 4],
    accel_limit: f32,
    decel_factor: f32,
}

impl FrequencyRamp {
    fn new(config: &RampConfig) -> Self {
        Self {
            current_freq: 0.0,
            target_freq: 0.0,
            directions: [0.0; 4],
            accel_limit: config.accel_limit,
            decel_factor: config.decel_factor,
        }
    }
}

impl RampStrategy for FrequencyRamp {
    fn set_target(&mut self, rates: &WheelRates, freq_override: Option<f32>) {
        self.target_freq = freq_override.map(f32::abs).unwrap_or_else(|| rates.peak());
        self.directions = rates.as_array().map(f32::signum);
        for (dir, rate) in self.directions.iter_mut().zip(rates.as_array()) {
            if rate == 0.0 {
                *dir = 0.0;
            }
        }
    }

    fn advance(&mut self, dt: f32) -> [f32; 4] {
        if self.target_freq >= self.current_freq {
            let step = self.accel_limit * dt;
            self.current_freq = (self.current_freq + step).min(self.target_freq);
        } else {
            let step = self.accel_limit * self.decel_factor * dt;
            self.current_freq = (self.current_freq - step).max(self.target_freq);
        }
        self.directions.map(|d| d * self.current_freq)
    }

    fn target_peak(&self) -> f32 {
        self.target_freq
    }

    fn halt(&mut self) {
        self.current_freq = 0.0;
        self.target_freq = 0.0;
        self.directions = [0.0; 4];
    }
}

/// Acceleration-bounded actuation with enable debouncing.
pub struct RampController {
    strategy: Box<dyn RampStrategy>,
    dead_band: f32,
    settle_secs: f32,
    settle_remaining: f32,
    enabled: bool,
}

impl RampController {
    /// Build with the configured strategy.
    pub fn new(config: &RampConfig) -> Self {
        let strategy: Box<dyn RampStrategy> = match config.strategy {
            RampStrategyKind::PerWheel => Box::new(PerWheelRamp::new(config)),
            RampStrategyKind::Frequency => Box::new(FrequencyRamp::new(config)),
        };
        Self {
            strategy,
            dead_band: config.dead_band,
            settle_secs: config.settle_secs,
            settle_remaining: 0.0,
            enabled: false,
        }
    }

    /// Re-enable the drivers. Stepping resumes after the settle delay, which
    /// gives the driver chips time to power up.
    pub fn wake(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.settle_remaining = self.settle_secs;
        }
    }

    /// Set the target rates for subsequent ticks. The optional frequency
    /// override replaces the derived shared frequency (diagnostics only).
    pub fn set_target(&mut self, rates: &WheelRates, freq_override: Option<f32>) {
        self.strategy.set_target(rates, freq_override);
    }

    /// Advance the ramp by `dt` and produce this tick's actuation output.
    pub fn advance(&mut self, dt: f32) -> DriveOutput {
        if !self.enabled {
            return DriveOutput::default();
        }

        if self.settle_remaining > 0.0 {
            self.settle_remaining -= dt;
            return DriveOutput {
                channels: [0.0; 4],
                enabled: true,
            };
        }

        let channels = self.strategy.advance(dt);
        let peak = channels.iter().fold(0.0_f32, |acc, c| acc.max(c.abs()));

        // Inside the dead-band with nothing meaningful requested: stop
        // exactly and drop the enable line so the steppers do not chatter.
        if peak < self.dead_band && self.strategy.target_peak() < self.dead_band {
            self.strategy.halt();
            self.enabled = false;
            return DriveOutput::default();
        }

        DriveOutput {
            channels,
            enabled: true,
        }
    }

    /// Snap everything to zero and disable, e.g. on loop shutdown.
    pub fn halt(&mut self) {
        self.strategy.halt();
        self.enabled = false;
        self.settle_remaining = 0.0;
    }

    /// Whether the drivers are currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    fn config(strategy: RampStrategyKind) -> RampConfig {
        RampConfig {
            strategy,
            ..RampConfig::default()
        }
    }

    fn rates(fl: f32, fr: f32, bl: f32, br: f32) -> WheelRates {
        WheelRates {
            front_left: fl,
            front_right: fr,
            back_left: bl,
            back_right: br,
        }
    }

    /// Drive the controller past its settle delay so ramping is observable.
    fn settled_controller(strategy: RampStrategyKind) -> RampController {
        let mut ctrl = RampController::new(&config(strategy));
        ctrl.wake();
        while ctrl.settle_remaining > 0.0 {
            ctrl.advance(DT);
        }
        ctrl
    }

    #[test]
    fn test_per_wheel_change_is_bounded_per_channel() {
        let cfg = config(RampStrategyKind::PerWheel);
        let bound = cfg.accel_limit * DT + 1e-3;

        let mut ctrl = settled_controller(RampStrategyKind::PerWheel);
        let targets = [
            rates(3000.0, -3000.0, 1500.0, -1500.0),
            rates(500.0, 500.0, 500.0, 500.0),
            rates(-2000.0, 2000.0, -2000.0, 2000.0),
        ];

        let mut last = [0.0_f32; 4];
        for target in targets {
            ctrl.set_target(&target, None);
            ctrl.wake();
            for _ in 0..100 {
                let out = ctrl.advance(DT);
                for (channel, prev) in out.channels.iter().zip(last) {
                    assert!(
                        (channel - prev).abs() <= bound,
                        "channel jumped {} -> {}",
                        prev,
                        channel
                    );
                }
                last = out.channels;
            }
        }
    }

    #[test]
    fn test_frequency_magnitude_change_is_bounded() {
        let cfg = config(RampStrategyKind::Frequency);
        let bound = cfg.accel_limit * cfg.decel_factor * DT + 1e-3;

        let mut ctrl = settled_controller(RampStrategyKind::Frequency);
        let targets = [
            rates(3000.0, 3000.0, 3000.0, 3000.0),
            rates(500.0, 500.0, 500.0, 500.0),
            rates(0.0, 0.0, 0.0, 0.0),
            rates(-2000.0, 2000.0, -2000.0, 2000.0),
        ];

        let mut last_peak = 0.0_f32;
        for target in targets {
            ctrl.set_target(&target, None);
            ctrl.wake();
            for _ in 0..100 {
                let peak = ctrl.advance(DT).peak();
                assert!(
                    (peak - last_peak).abs() <= bound,
                    "magnitude jumped {} -> {}",
                    last_peak,
                    peak
                );
                last_peak = peak;
            }
        }
    }

    #[test]
    fn test_acceleration_bound_tight() {
        let cfg = config(RampStrategyKind::Frequency);
        let mut ctrl = settled_controller(RampStrategyKind::Frequency);

        ctrl.set_target(&rates(3000.0, 3000.0, 3000.0, 3000.0), None);
        let out = ctrl.advance(DT);
        assert_relative_eq!(out.peak(), cfg.accel_limit * DT, epsilon = 1e-3);
    }

    #[test]
    fn test_deceleration_is_faster() {
        let cfg = config(RampStrategyKind::Frequency);
        let mut ctrl = settled_controller(RampStrategyKind::Frequency);

        ctrl.set_target(&rates(3000.0, 3000.0, 3000.0, 3000.0), None);
        for _ in 0..100 {
            ctrl.advance(DT);
        }

        ctrl.set_target(&rates(0.0, 0.0, 0.0, 0.0), None);
        let before = 3000.0;
        let after = ctrl.advance(DT).peak();
        assert_relative_eq!(
            before - after,
            cfg.accel_limit * cfg.decel_factor * DT,
            epsilon = 1e-2
        );
    }

    #[test]
    fn test_zero_target_snaps_exactly_and_disables() {
        for strategy in [RampStrategyKind::PerWheel, RampStrategyKind::Frequency] {
            let mut ctrl = settled_controller(strategy);

            ctrl.set_target(&rates(1000.0, 1000.0, 1000.0, 1000.0), None);
            for _ in 0..50 {
                ctrl.advance(DT);
            }

            ctrl.set_target(&rates(0.0, 0.0, 0.0, 0.0), None);
            let mut out = ctrl.advance(DT);
            for _ in 0..200 {
                if out.is_stopped() {
                    break;
                }
                out = ctrl.advance(DT);
            }

            assert!(out.is_stopped(), "{:?}: never reached exact zero", strategy);
            assert!(!out.enabled, "{:?}: drivers still enabled at rest", strategy);
            assert!(!ctrl.is_enabled());

            // And it stays at zero afterwards
            let out = ctrl.advance(DT);
            assert!(out.is_stopped());
        }
    }

    #[test]
    fn test_settle_delay_gates_stepping() {
        let cfg = config(RampStrategyKind::Frequency);
        let mut ctrl = RampController::new(&cfg);

        ctrl.wake();
        ctrl.set_target(&rates(2000.0, 2000.0, 2000.0, 2000.0), None);

        let mut settle_ticks = 0;
        loop {
            let out = ctrl.advance(DT);
            if out.peak() > 0.0 {
                break;
            }
            assert!(out.enabled, "enable line must be up during settle");
            settle_ticks += 1;
            assert!(settle_ticks < 100, "never exited settle");
        }

        let expected = (cfg.settle_secs / DT).ceil() as u32;
        assert_eq!(settle_ticks, expected);
    }

    #[test]
    fn test_disabled_controller_outputs_nothing() {
        let mut ctrl = RampController::new(&config(RampStrategyKind::PerWheel));
        ctrl.set_target(&rates(2000.0, 2000.0, 2000.0, 2000.0), None);
        let out = ctrl.advance(DT);
        assert!(out.is_stopped());
        assert!(!out.enabled);
    }

    #[test]
    fn test_frequency_override() {
        let mut ctrl = settled_controller(RampStrategyKind::Frequency);

        ctrl.set_target(&rates(3000.0, 3000.0, 3000.0, 3000.0), Some(500.0));
        let mut out = DriveOutput::default();
        for _ in 0..100 {
            out = ctrl.advance(DT);
        }
        // Ramp converges to the override, not the derived peak
        assert_relative_eq!(out.peak(), 500.0, epsilon = 1e-3);
    }

    #[test]
    fn test_frequency_directions_follow_rates() {
        let mut ctrl = settled_controller(RampStrategyKind::Frequency);

        ctrl.set_target(&rates(-2000.0, 2000.0, -2000.0, 2000.0), None);
        let mut out = DriveOutput::default();
        for _ in 0..50 {
            out = ctrl.advance(DT);
        }
        assert!(out.channels[0] < 0.0);
        assert!(out.channels[1] > 0.0);
        assert!(out.channels[2] < 0.0);
        assert!(out.channels[3] > 0.0);
        // Shared frequency: all magnitudes equal
        assert_relative_eq!(out.channels[0].abs(), out.channels[1].abs());
    }
}
